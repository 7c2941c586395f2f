//! Storage traits and error types
//!
//! This module defines the key-value interface that queue backends implement
//! and the errors they can raise.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// One page of keys returned by a prefix scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    /// Keys in this page; may be empty even when `next` is set
    pub keys: Vec<String>,

    /// Opaque cursor for the following page, `None` once the scan is complete
    pub next: Option<String>,
}

/// Trait for key-value backends holding queue records
///
/// Every operation is atomic for a single key only. Implementations must be
/// safe to share between tasks.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Fetches the value stored under `key`
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Removes `key`; removing an absent key is not an error
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Returns true if `key` is present
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Lists keys starting with `prefix`, one page at a time
    ///
    /// # Arguments
    ///
    /// * `prefix` - Literal key prefix (no pattern characters)
    /// * `cursor` - `None` to start, or the `next` value of the previous page
    /// * `count` - Page size hint
    ///
    /// # Returns
    ///
    /// A page of keys and the cursor to continue from. Keys written or
    /// removed during a scan may or may not be observed.
    async fn scan_prefix(
        &self,
        prefix: &str,
        cursor: Option<String>,
        count: usize,
    ) -> StoreResult<ScanPage>;
}
