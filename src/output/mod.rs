//! Output module for captured pages and queue reports
//!
//! This module handles:
//! - Persisting captured detail-page HTML through an [`ArtifactSink`]
//! - Counting queue records and printing a statistics report

mod sink;
pub mod stats;

pub use sink::{ArtifactSink, FileSink, SinkError};
pub use stats::{load_statistics, print_statistics, QueueStatistics};
