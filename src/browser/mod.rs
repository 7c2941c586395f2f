//! Browser automation surface
//!
//! This module defines the operations the crawler performs against a page:
//! - Navigating to a URL and following a "click" on an element
//! - Checking for and extracting elements by CSS selector
//! - Capturing the current page's HTML
//!
//! [`HttpBrowser`] implements them over plain HTTP and static HTML; [`Session`]
//! adds per-operation timeouts and navigation retries on top of any backend.

pub mod dom;
mod http;
mod session;

pub use http::{build_http_client, HttpBrowser};
pub use session::Session;

use crate::UrlError;
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Errors raised by browser operations
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("No element matches '{0}'")]
    ElementNotFound(String),

    #[error("Element '{0}' has no link to follow")]
    NotClickable(String),

    #[error("No page is loaded")]
    NoPage,

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("Invalid request header '{0}'")]
    InvalidHeader(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),
}

impl BrowserError {
    /// Returns true for failures worth another navigation attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Result type for browser operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// A page automation backend
///
/// Every method takes `&mut self`: a browser has one owner that drives it
/// sequentially.
#[async_trait]
pub trait Browser: Send {
    /// Loads `url`, replacing the current page
    async fn navigate(&mut self, url: &Url) -> BrowserResult<()>;

    /// Activates the first element matching `selector`
    async fn click(&mut self, selector: &str) -> BrowserResult<()>;

    /// Returns true if any element matches `selector`
    async fn exists(&mut self, selector: &str) -> BrowserResult<bool>;

    /// Text content of every element matching `selector`
    async fn extract_text(&mut self, selector: &str) -> BrowserResult<Vec<String>>;

    /// Non-empty values of `attribute` on every element matching `selector`
    async fn extract_attribute(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> BrowserResult<Vec<String>>;

    /// URL of the current page
    async fn current_url(&mut self) -> BrowserResult<Url>;

    /// HTML of the current page
    async fn html(&mut self) -> BrowserResult<String>;

    /// Releases the page
    async fn close(&mut self) -> BrowserResult<()>;
}
