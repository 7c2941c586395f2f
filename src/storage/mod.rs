//! Storage module for persisting queue records
//!
//! This module provides the key-value backends behind the job queue:
//! - SQLite (single file, WAL mode) for local runs
//! - Redis for shared deployments
//! - An in-memory map for tests and dry runs

mod memory;
mod redis_store;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use sqlite::SqliteStore;
pub use traits::{KvStore, ScanPage, StoreError, StoreResult};

use crate::config::{StoreBackend, StoreConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Opens the backend selected by the `[store]` configuration
///
/// # Arguments
///
/// * `config` - Store configuration (already validated)
///
/// # Returns
///
/// * `Ok(Arc<dyn KvStore>)` - Connected store
/// * `Err(StoreError)` - Failed to open or connect
pub async fn open_store(config: &StoreConfig) -> StoreResult<Arc<dyn KvStore>> {
    match config.backend {
        StoreBackend::Sqlite => {
            let path = config
                .path
                .as_deref()
                .ok_or_else(|| StoreError::Database("store.path is not set".to_string()))?;
            info!("Opening SQLite store at {}", path);
            Ok(Arc::new(SqliteStore::new(Path::new(path))?))
        }
        StoreBackend::Redis => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| StoreError::Database("store.url is not set".to_string()))?;
            info!("Connecting to Redis store");
            Ok(Arc::new(RedisStore::connect(url).await?))
        }
    }
}
