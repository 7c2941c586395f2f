//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the KvStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{KvStore, ScanPage, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite key-value backend
///
/// The connection sits behind a mutex; each operation is one short statement,
/// so the lock is never held across an await point.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates a SqliteStore at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database
    pub fn new(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn()?
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.conn()?
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let found: Option<i64> = self
            .conn()?
            .query_row("SELECT 1 FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    async fn scan_prefix(
        &self,
        prefix: &str,
        cursor: Option<String>,
        count: usize,
    ) -> StoreResult<ScanPage> {
        let count = count.max(1);
        // Keyset paging: resume strictly after the last key of the previous page
        let after = cursor.unwrap_or_default();

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT key FROM kv
             WHERE key >= ?1 AND key > ?2 AND substr(key, 1, length(?1)) = ?1
             ORDER BY key
             LIMIT ?3",
        )?;

        let keys = stmt
            .query_map(params![prefix, after, count as i64], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        let next = if keys.len() == count {
            keys.last().cloned()
        } else {
            None
        };

        Ok(ScanPage { keys, next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = SqliteStore::new_in_memory().unwrap();

        store.set("pending_job:https://a.test/1", "{}").await.unwrap();
        assert_eq!(
            store.get("pending_job:https://a.test/1").await.unwrap(),
            Some("{}".to_string())
        );
        assert!(store.exists("pending_job:https://a.test/1").await.unwrap());

        store.delete("pending_job:https://a.test/1").await.unwrap();
        assert_eq!(store.get("pending_job:https://a.test/1").await.unwrap(), None);
        assert!(!store.exists("pending_job:https://a.test/1").await.unwrap());

        // Deleting twice is fine
        store.delete("pending_job:https://a.test/1").await.unwrap();
    }

    #[tokio::test]
    async fn test_set_replaces_value() {
        let store = SqliteStore::new_in_memory().unwrap();

        store.set("k", "one").await.unwrap();
        store.set("k", "two").await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some("two".to_string()));
    }

    #[tokio::test]
    async fn test_scan_pages_cover_every_key_once() {
        let store = SqliteStore::new_in_memory().unwrap();
        for i in 0..25 {
            store
                .set(&format!("pending_job:https://a.test/{:02}", i), "{}")
                .await
                .unwrap();
        }

        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let page = store.scan_prefix("pending_job:", cursor, 10).await.unwrap();
            assert!(page.keys.len() <= 10);
            seen.extend(page.keys);
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(seen.len(), 25);
        let mut deduped = seen.clone();
        deduped.dedup();
        assert_eq!(deduped, seen);
    }

    #[tokio::test]
    async fn test_scan_is_isolated_by_prefix() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.set("pending_job:https://a.test/1", "{}").await.unwrap();
        store.set("success_job:https://a.test/2", "{}").await.unwrap();
        store.set("pending_jobs_other", "{}").await.unwrap();
        store.set("pending_job_", "{}").await.unwrap();

        let page = store.scan_prefix("pending_job:", None, 100).await.unwrap();

        assert_eq!(page.keys, vec!["pending_job:https://a.test/1".to_string()]);
        assert_eq!(page.next, None);
    }

    #[tokio::test]
    async fn test_scan_tolerates_deletion_between_pages() {
        let store = SqliteStore::new_in_memory().unwrap();
        for i in 0..6 {
            store.set(&format!("p:{}", i), "{}").await.unwrap();
        }

        let first = store.scan_prefix("p:", None, 3).await.unwrap();
        assert_eq!(first.keys, vec!["p:0", "p:1", "p:2"]);

        store.delete("p:2").await.unwrap();
        store.delete("p:3").await.unwrap();

        let second = store.scan_prefix("p:", first.next, 3).await.unwrap();
        assert_eq!(second.keys, vec!["p:4", "p:5"]);
        assert_eq!(second.next, None);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let file = NamedTempFile::new().unwrap();

        {
            let store = SqliteStore::new(file.path()).unwrap();
            store.set("k", "v").await.unwrap();
        }

        let store = SqliteStore::new(file.path()).unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
    }
}
