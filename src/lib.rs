//! job-crawl: durable crawl-job orchestration for job-posting sites
//!
//! This crate discovers detail-page URLs from paginated listing pages, stores
//! them as crawl jobs in a key-value backed queue, and drains that queue by
//! fetching each page through an automation surface and persisting the HTML
//! for offline extraction.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod job;
pub mod output;
pub mod queue;
pub mod storage;
pub mod url;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Job error: {0}")]
    Job(#[from] job::JobError),

    #[error("Store error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] queue::QueueError),

    #[error("Browser error: {0}")]
    Browser(#[from] browser::BrowserError),

    #[error("Artifact sink error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("Pagination error: {0}")]
    Pagination(#[from] PaginationError),

    #[error("No listing pages found to crawl")]
    NoSeeds,

    #[error("All {seeds} listing pages failed")]
    AllSeedsFailed { seeds: usize },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Errors raised while computing the pages of a paginated listing
#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("per-page is zero; cannot compute a page count")]
    ZeroPageSize,

    #[error("No element matched total count selector '{0}'")]
    TotalCountMissing(String),

    #[error("No digits found in total count text '{0}'")]
    TotalCountNotFound(String),

    #[error("Total count '{0}' does not fit in an integer")]
    TotalCountOverflow(String),

    #[error("param-identifier is required for {0} pagination")]
    MissingIdentifier(&'static str),

    #[error("Invalid page format '{0}': expected exactly one %d or %0Nd directive")]
    InvalidFormat(String),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),
}

// Re-export commonly used types
pub use config::Config;
pub use job::{CrawlJob, JobStatus};
pub use queue::JobQueue;
pub use crate::url::resolve;
