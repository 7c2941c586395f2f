//! In-memory storage backend
//!
//! Used by tests and dry runs. Contents are lost when the store is dropped.

use crate::storage::traits::{KvStore, ScanPage, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Mutex;

/// Ordered in-memory key-value store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.contains_key(key))
    }

    async fn scan_prefix(
        &self,
        prefix: &str,
        cursor: Option<String>,
        count: usize,
    ) -> StoreResult<ScanPage> {
        let count = count.max(1);
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;

        let start = match cursor {
            Some(after) => Bound::Excluded(after),
            None => Bound::Included(prefix.to_string()),
        };

        let keys: Vec<String> = entries
            .range((start, Bound::Unbounded))
            .map(|(k, _)| k)
            .skip_while(|k| k.as_str() < prefix)
            .take_while(|k| k.starts_with(prefix))
            .take(count)
            .cloned()
            .collect();

        let next = if keys.len() == count {
            keys.last().cloned()
        } else {
            None
        };

        Ok(ScanPage { keys, next })
    }
}
