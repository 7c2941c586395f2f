use crate::UrlError;
use url::{ParseError, Url};

/// Resolves a possibly-relative link against a base URL
///
/// If `target` already parses as an absolute URL it is returned unchanged;
/// otherwise it is resolved as a relative reference against `base` using
/// standard reference resolution (relative path, query-only, fragment-only).
///
/// # Errors
///
/// Fails only if `base` or `target` is not a syntactically valid URL reference.
///
/// # Examples
///
/// ```
/// use job_crawl::url::resolve;
///
/// let url = resolve("https://a.example/b/c", "../d?x=1").unwrap();
/// assert_eq!(url.as_str(), "https://a.example/d?x=1");
///
/// let url = resolve("https://a.example/b", "https://c.example/d").unwrap();
/// assert_eq!(url.as_str(), "https://c.example/d");
/// ```
pub fn resolve(base: &str, target: &str) -> Result<Url, UrlError> {
    let base = Url::parse(base.trim())
        .map_err(|e| UrlError::Parse(format!("base URL '{}': {}", base, e)))?;
    resolve_against(&base, target)
}

/// Same as [`resolve`], for a base that is already parsed
pub fn resolve_against(base: &Url, target: &str) -> Result<Url, UrlError> {
    let target = target.trim();
    match Url::parse(target) {
        Ok(absolute) => Ok(absolute),
        Err(ParseError::RelativeUrlWithoutBase) => base
            .join(target)
            .map_err(|e| UrlError::Parse(format!("'{}' against '{}': {}", target, base, e))),
        Err(e) => Err(UrlError::Parse(format!("target URL '{}': {}", target, e))),
    }
}

/// Parses a URL that must be absolute, http(s), and carry a host
pub fn parse_absolute(raw: &str) -> Result<Url, UrlError> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(format!("'{}': {}", raw, e)))?;
    check_fetchable(&url)?;
    Ok(url)
}

/// Checks that an already parsed URL can be fetched by the crawler
pub fn check_fetchable(url: &Url) -> Result<(), UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(UrlError::MissingHost(url.to_string())),
    }
}
