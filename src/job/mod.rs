//! Crawl job model
//!
//! - `CrawlJob`: one URL to fetch, with its surrogate id and status
//! - `JobStatus`: PENDING → SUCCESS | FAILED

mod crawl_job;
mod status;

pub use crawl_job::CrawlJob;
pub use status::JobStatus;

use crate::UrlError;
use thiserror::Error;

/// Errors raised when constructing or rebuilding a job
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Invalid job URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("Invalid job id: {0}")]
    InvalidId(String),

    #[error("Invalid job status: {0}")]
    InvalidStatus(String),
}
