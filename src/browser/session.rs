//! Bounded browser session
//!
//! Wraps a [`Browser`] so every call is limited by the configured timeout and
//! navigation is retried on transient failures.

use crate::browser::{Browser, BrowserError, BrowserResult};
use crate::config::CrawlerConfig;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use url::Url;

const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Single-owner handle on a browser
pub struct Session {
    browser: Box<dyn Browser>,
    timeout: Duration,
    retry_count: u32,
    backoff: Duration,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(browser: Box<dyn Browser>, config: &CrawlerConfig) -> Self {
        Self::with_limits(browser, config.timeout(), config.retry_count, RETRY_BACKOFF)
    }

    /// Creates a session with explicit limits
    ///
    /// # Arguments
    ///
    /// * `timeout` - Deadline for each individual operation
    /// * `retry_count` - Extra navigation attempts after a retryable failure
    /// * `backoff` - Base delay between attempts, multiplied by the attempt number
    pub fn with_limits(
        browser: Box<dyn Browser>,
        timeout: Duration,
        retry_count: u32,
        backoff: Duration,
    ) -> Self {
        Self {
            browser,
            timeout,
            retry_count,
            backoff,
            cancel: CancellationToken::new(),
        }
    }

    /// Stops retry backoff early once `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Navigates to `url`, retrying timeouts, connection failures and 5xx responses
    ///
    /// On cancellation the pending retry is abandoned and the last failure returned.
    pub async fn navigate(&mut self, url: &Url) -> BrowserResult<()> {
        let mut attempt = 0;
        loop {
            match bounded(self.timeout, "navigate", self.browser.navigate(url)).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.retry_count => {
                    attempt += 1;
                    warn!(
                        "Navigation to {} failed ({}); retry {}/{}",
                        url, e, attempt, self.retry_count
                    );
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(e),
                        _ = tokio::time::sleep(self.backoff * attempt) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn click(&mut self, selector: &str) -> BrowserResult<()> {
        bounded(self.timeout, "click", self.browser.click(selector)).await
    }

    pub async fn exists(&mut self, selector: &str) -> BrowserResult<bool> {
        bounded(self.timeout, "exists", self.browser.exists(selector)).await
    }

    pub async fn extract_text(&mut self, selector: &str) -> BrowserResult<Vec<String>> {
        bounded(self.timeout, "extract_text", self.browser.extract_text(selector)).await
    }

    pub async fn extract_attribute(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> BrowserResult<Vec<String>> {
        bounded(
            self.timeout,
            "extract_attribute",
            self.browser.extract_attribute(selector, attribute),
        )
        .await
    }

    pub async fn current_url(&mut self) -> BrowserResult<Url> {
        bounded(self.timeout, "current_url", self.browser.current_url()).await
    }

    pub async fn html(&mut self) -> BrowserResult<String> {
        bounded(self.timeout, "html", self.browser.html()).await
    }

    pub async fn close(&mut self) -> BrowserResult<()> {
        bounded(self.timeout, "close", self.browser.close()).await
    }
}

async fn bounded<T>(
    limit: Duration,
    operation: &str,
    fut: impl Future<Output = BrowserResult<T>>,
) -> BrowserResult<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(BrowserError::Timeout {
            operation: operation.to_string(),
            seconds: limit.as_secs(),
        }),
    }
}
