//! Listing-page URL arithmetic
//!
//! A paginated listing encodes its page number in one of three places. These
//! functions strip it (to get the canonical "page one" URL) and put it back
//! (to synthesize page N):
//!
//! | Type      | Page 3 of `/jobs/`   |
//! |-----------|----------------------|
//! | `query`   | `/jobs/?page=3`      |
//! | `path`    | `/jobs/page/3`       |
//! | `segment` | `/jobs/p3`           |
//! | `none`    | `/jobs/` (unchanged) |

use crate::config::{PaginationConfig, PaginationType};
use crate::PaginationError;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Widest zero padding accepted in a `%0Nd` directive
const MAX_PAGE_WIDTH: usize = 10;

fn directive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"%(0\d+)?d").expect("static regex"))
}

/// Formats a page number with a printf-style format
///
/// Supports exactly one `%d` or zero-padded `%0Nd` directive, surrounded by
/// any literal text that contains no other `%`.
///
/// ```
/// use job_crawl::url::format_page_number;
///
/// assert_eq!(format_page_number("%d", 7).unwrap(), "7");
/// assert_eq!(format_page_number("%03d", 7).unwrap(), "007");
/// assert_eq!(format_page_number("page-%d.html", 2).unwrap(), "page-2.html");
/// ```
pub fn format_page_number(format: &str, page: u32) -> Result<String, PaginationError> {
    let invalid = || PaginationError::InvalidFormat(format.to_string());

    let mut matches = directive_pattern().captures_iter(format);
    let captures = matches.next().ok_or_else(invalid)?;
    if matches.next().is_some() {
        return Err(invalid());
    }

    let directive = captures.get(0).ok_or_else(invalid)?;
    let prefix = &format[..directive.start()];
    let suffix = &format[directive.end()..];
    if prefix.contains('%') || suffix.contains('%') {
        return Err(invalid());
    }

    let number = match captures.get(1) {
        Some(width) => {
            let width: usize = width.as_str()[1..].parse().map_err(|_| invalid())?;
            if width > MAX_PAGE_WIDTH {
                return Err(invalid());
            }
            format!("{:0width$}", page, width = width)
        }
        None => page.to_string(),
    };

    Ok(format!("{}{}{}", prefix, number, suffix))
}

fn identifier<'a>(pagination: &'a PaginationConfig) -> Result<&'a str, PaginationError> {
    pagination
        .identifier()
        .ok_or(PaginationError::MissingIdentifier(pagination.kind.as_str()))
}

/// Normalizes a listing URL to its canonical "page one" form
///
/// Strips the query parameter, the trailing `/<identifier>/<n>` path, or the
/// trailing `<identifier><n>` segment, depending on the pagination type.
/// URLs that carry no page marker are returned unchanged.
pub fn normalize_to_page_one(url: &Url, pagination: &PaginationConfig) -> Url {
    let Some(ident) = pagination.identifier() else {
        return url.clone();
    };

    let mut normalized = url.clone();
    match pagination.kind {
        PaginationType::Query => {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(key, _)| key != ident)
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect();
            set_query_pairs(&mut normalized, &kept);
        }
        PaginationType::Path => {
            let pattern = format!(r"/{}/\d+$", regex::escape(ident));
            strip_path_suffix(&mut normalized, &pattern);
        }
        PaginationType::Segment => {
            let pattern = format!(r"/{}\d+$", regex::escape(ident));
            strip_path_suffix(&mut normalized, &pattern);
        }
        PaginationType::None => {}
    }
    normalized
}

/// Builds the URL of page `page` from a page-one URL
///
/// This is the inverse of [`normalize_to_page_one`]: it sets the query
/// parameter, appends `/<identifier>/<n>`, or appends `<identifier><n>`.
pub fn build_paginated_url(
    page_one: &Url,
    page: u32,
    pagination: &PaginationConfig,
) -> Result<Url, PaginationError> {
    let mut url = page_one.clone();
    match pagination.kind {
        PaginationType::Query => {
            let ident = identifier(pagination)?;
            let mut pairs: Vec<(String, String)> = page_one
                .query_pairs()
                .filter(|(key, _)| key != ident)
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect();
            pairs.push((ident.to_string(), page.to_string()));
            set_query_pairs(&mut url, &pairs);
        }
        PaginationType::Path => {
            let ident = identifier(pagination)?;
            let number = format_page_number(pagination.format(), page)?;
            let base = page_one.path().trim_end_matches('/');
            url.set_path(&format!("{}/{}/{}", base, ident, number));
        }
        PaginationType::Segment => {
            let ident = identifier(pagination)?;
            let number = format_page_number(pagination.format(), page)?;
            let base = page_one.path().trim_end_matches('/');
            url.set_path(&format!("{}/{}{}", base, ident, number));
        }
        PaginationType::None => {}
    }
    Ok(url)
}

fn set_query_pairs(url: &mut Url, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        url.set_query(None);
        return;
    }
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
}

fn strip_path_suffix(url: &mut Url, pattern: &str) {
    // The identifier is escaped, so the pattern always compiles
    let Ok(re) = Regex::new(pattern) else {
        return;
    };
    let stripped = re.replace(url.path(), "/").into_owned();
    url.set_path(&stripped);
}
