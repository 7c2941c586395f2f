//! Crawler module: job generation and execution
//!
//! This module contains the core crawling logic, including:
//! - Pagination strategies over listing pages
//! - Bounded concurrent submission of discovered URLs
//! - The generation pass that fills the queue
//! - The execution pass that drains it

mod executor;
mod generator;
mod strategy;
mod submit;

pub use executor::{ExecutionSummary, Executor};
pub use generator::{GenerationSummary, Generator};
pub use strategy::{page_count, parse_total_count, run_strategy};
pub use submit::{SubmitReport, Submitter};

use crate::browser::{HttpBrowser, Session};
use crate::config::Config;
use crate::output::FileSink;
use crate::queue::JobQueue;
use crate::CrawlError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs a generation pass with an HTTP browser
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `queue` - Queue receiving new PENDING jobs
/// * `cancel` - Stops the pass between listing pages and submissions
///
/// # Returns
///
/// * `Ok(GenerationSummary)` - The pass completed or was cancelled
/// * `Err(CrawlError)` - No seeds, every seed failed, or the browser could not start
pub async fn generate(
    config: Arc<Config>,
    queue: Arc<JobQueue>,
    cancel: CancellationToken,
) -> Result<GenerationSummary, CrawlError> {
    let browser = HttpBrowser::new(&config.crawler)?;
    let session =
        Session::new(Box::new(browser), &config.crawler).with_cancellation(cancel.clone());
    Generator::new(config, session, queue, cancel).generate().await
}

/// Runs an execution pass with an HTTP browser, writing pages to the output directory
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `queue` - Queue holding PENDING jobs
/// * `cancel` - Stops the pass between jobs and batches
///
/// # Returns
///
/// * `Ok(ExecutionSummary)` - The pass completed or was cancelled
/// * `Err(CrawlError)` - A queue scan or store write failed
pub async fn execute(
    config: Arc<Config>,
    queue: Arc<JobQueue>,
    cancel: CancellationToken,
) -> Result<ExecutionSummary, CrawlError> {
    let browser = HttpBrowser::new(&config.crawler)?;
    let session =
        Session::new(Box::new(browser), &config.crawler).with_cancellation(cancel.clone());
    let sink = Arc::new(FileSink::new(&config.crawler.output_directory));
    Executor::new(config, session, queue, sink, cancel)
        .execute()
        .await
}

/// Sleeps for `duration` unless cancelled first
///
/// Returns false if the token was cancelled.
pub(crate) async fn pause(cancel: &CancellationToken, duration: Duration) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pause_completes() {
        let cancel = CancellationToken::new();
        assert!(pause(&cancel, Duration::from_millis(5)).await);
        assert!(pause(&cancel, Duration::ZERO).await);
    }

    #[tokio::test]
    async fn test_pause_is_interrupted_by_cancel() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        assert!(!pause(&cancel, Duration::from_secs(30)).await);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
