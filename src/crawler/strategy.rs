//! Pagination strategies
//!
//! With the session positioned on a listing page, a strategy enqueues every
//! reachable URL of that listing:
//!
//! - `next_link` walks the "next page" control and enqueues the detail links
//!   found on each page
//! - `total_count` reads the result count, derives the number of pages and
//!   enqueues the URL of every listing page

use crate::browser::Session;
use crate::config::{Config, CrawlStrategy, PaginationType};
use crate::crawler::submit::{SubmitReport, Submitter};
use crate::url::{build_paginated_url, normalize_to_page_one, parse_absolute};
use crate::{ConfigError, CrawlError, PaginationError};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use url::Url;

/// Runs the configured strategy on the current listing page
///
/// Counts are accumulated into `report` as pages are processed, so they stay
/// accurate when the strategy fails part way through.
pub async fn run_strategy(
    session: &mut Session,
    config: &Config,
    submitter: &Submitter,
    report: &mut SubmitReport,
) -> Result<(), CrawlError> {
    match config.crawler.strategy {
        CrawlStrategy::NextLink => follow_next_links(session, config, submitter, report).await,
        CrawlStrategy::TotalCount => enqueue_counted_pages(session, config, submitter, report).await,
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, CrawlError> {
    value.as_deref().ok_or_else(|| {
        ConfigError::Validation(format!("selector.{} is not configured", name)).into()
    })
}

async fn follow_next_links(
    session: &mut Session,
    config: &Config,
    submitter: &Submitter,
    report: &mut SubmitReport,
) -> Result<(), CrawlError> {
    let detail_selector = required(&config.selector.detail_links, "detail-links")?;
    let next_selector = required(&config.selector.next_page, "next-page")?;
    let detail_base = config
        .crawler
        .detail_base_url
        .as_deref()
        .map(parse_absolute)
        .transpose()?;
    let max_pages = config.pagination.max_pages;

    let mut visited: HashSet<Url> = HashSet::new();
    let mut pages = 0u32;

    loop {
        if submitter.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let current = session.current_url().await?;
        visited.insert(current.clone());
        pages += 1;

        let links = session.extract_attribute(detail_selector, "href").await?;
        let base = detail_base.as_ref().unwrap_or(&current);
        let page_report = submitter.submit_links(base, &links).await;
        info!(
            "Page {} ({}): {} detail links, {} new jobs",
            pages,
            current,
            links.len(),
            page_report.submitted
        );
        report.merge(page_report);

        if report.cancelled {
            break;
        }

        if !session.exists(next_selector).await? {
            debug!("No next-page control on {}", current);
            break;
        }

        if pages >= max_pages {
            warn!(
                "Stopping after {} pages (max-pages) although {} has a next page",
                pages, current
            );
            break;
        }

        session.click(next_selector).await?;

        let next = session.current_url().await?;
        if visited.contains(&next) {
            warn!("Next page of {} leads back to {}; stopping", current, next);
            break;
        }
    }

    Ok(())
}

async fn enqueue_counted_pages(
    session: &mut Session,
    config: &Config,
    submitter: &Submitter,
    report: &mut SubmitReport,
) -> Result<(), CrawlError> {
    let selector = required(&config.selector.total_count, "total-count")?;
    let pagination = &config.pagination;

    let texts = session.extract_text(selector).await?;
    let text = match texts.as_slice() {
        [] => return Err(PaginationError::TotalCountMissing(selector.to_string()).into()),
        [only] => only,
        [first, ..] => {
            warn!(
                "{} elements match total-count selector '{}'; using the first",
                texts.len(),
                selector
            );
            first
        }
    };

    let total = parse_total_count(text)?;
    let count = page_count(total, pagination.per_page)?;

    let current = session.current_url().await?;
    let first = normalize_to_page_one(&current, pagination);
    info!(
        "{} results at {} per page: {} pages from {}",
        total, pagination.per_page, count, first
    );

    let links = page_urls(&first, count, config)?;
    let base = parse_absolute(&config.crawler.base_url)?;
    report.merge(submitter.submit_links(&base, &links).await);

    Ok(())
}

/// Builds the URL of every listing page
///
/// Pages run from the configured start through `count`, so a start above the
/// page count yields nothing. A listing without pagination is a single page.
/// Pages whose URL cannot be built are logged and skipped.
fn page_urls(first: &Url, count: u64, config: &Config) -> Result<Vec<String>, PaginationError> {
    let pagination = &config.pagination;

    if pagination.kind == PaginationType::None {
        return Ok(vec![first.to_string()]);
    }

    let last = u32::try_from(count)
        .map_err(|_| PaginationError::TotalCountOverflow(count.to_string()))?;

    let mut urls = Vec::new();
    for page in pagination.start..=last {
        match build_paginated_url(first, page, pagination) {
            Ok(url) => urls.push(url.to_string()),
            Err(e) => warn!("Skipping page {} of {}: {}", page, first, e),
        }
    }
    Ok(urls)
}

fn count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[0-9][0-9,]*").expect("static pattern"))
}

/// Extracts the result count from text such as `該当件数 1,234件`
///
/// Takes the first run of digits and commas, with commas removed.
pub fn parse_total_count(text: &str) -> Result<u64, PaginationError> {
    let digits = count_pattern()
        .find(text)
        .map(|m| m.as_str().replace(',', ""))
        .ok_or_else(|| PaginationError::TotalCountNotFound(text.to_string()))?;

    digits
        .parse::<u64>()
        .map_err(|_| PaginationError::TotalCountOverflow(text.to_string()))
}

/// Number of pages needed to show `total` results at `per_page` each
pub fn page_count(total: u64, per_page: u32) -> Result<u64, PaginationError> {
    if per_page == 0 {
        return Err(PaginationError::ZeroPageSize);
    }
    Ok(total.div_ceil(u64::from(per_page)))
}
