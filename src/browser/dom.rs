//! CSS selector queries over a fetched document
//!
//! `scraper::Html` is not `Send`, so documents are parsed and dropped inside
//! these synchronous helpers and never held across an await point.

use crate::browser::{BrowserError, BrowserResult};
use scraper::{Html, Selector};

/// Parses a CSS selector
pub fn parse_selector(selector: &str) -> BrowserResult<Selector> {
    Selector::parse(selector).map_err(|e| BrowserError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Counts the elements matching `selector`
pub fn count(html: &str, selector: &str) -> BrowserResult<usize> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document.select(&selector).count())
}

/// Returns the text content of every matching element, whitespace-collapsed
pub fn texts(html: &str, selector: &str) -> BrowserResult<Vec<String>> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .map(|element| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect())
}

/// Returns the non-empty values of `attribute` across matching elements
pub fn attributes(html: &str, selector: &str, attribute: &str) -> BrowserResult<Vec<String>> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .filter_map(|element| element.value().attr(attribute))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect())
}

/// Returns the link a click on the first matching element would follow
///
/// The element itself may be an anchor, or may wrap one.
pub fn click_target(html: &str, selector: &str) -> BrowserResult<String> {
    let parsed = parse_selector(selector)?;
    let anchor = parse_selector("a[href]")?;
    let document = Html::parse_document(html);

    let element = document
        .select(&parsed)
        .next()
        .ok_or_else(|| BrowserError::ElementNotFound(selector.to_string()))?;

    let href = element
        .value()
        .attr("href")
        .or_else(|| {
            element
                .select(&anchor)
                .next()
                .and_then(|a| a.value().attr("href"))
        })
        .map(str::trim)
        .filter(|href| !href.is_empty() && !href.starts_with("javascript:"));

    href.map(str::to_string)
        .ok_or_else(|| BrowserError::NotClickable(selector.to_string()))
}
