//! Redis storage implementation

use crate::storage::traits::{KvStore, ScanPage, StoreResult};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

/// Redis key-value backend
///
/// Holds one multiplexed connection; each operation works on a cheap clone
/// of it, so the store can be shared freely between tasks.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    /// Connects to the Redis server at `redis_url`
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Connection URL (`redis://` or `rediss://`)
    ///
    /// # Returns
    ///
    /// * `Ok(RedisStore)` - Connected store
    /// * `Err(StoreError)` - Invalid URL or unreachable server
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

/// Builds a SCAN MATCH pattern that matches `prefix` literally
pub(crate) fn match_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

#[async_trait]
impl KvStore for RedisStore {
    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut con = self.conn.clone();
        con.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut con = self.conn.clone();
        let value: Option<String> = con.get(key).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut con = self.conn.clone();
        con.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut con = self.conn.clone();
        let found: bool = con.exists(key).await?;
        Ok(found)
    }

    async fn scan_prefix(
        &self,
        prefix: &str,
        cursor: Option<String>,
        count: usize,
    ) -> StoreResult<ScanPage> {
        let mut con = self.conn.clone();
        let start: u64 = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);

        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(start)
            .arg("MATCH")
            .arg(match_pattern(prefix))
            .arg("COUNT")
            .arg(count.max(1))
            .query_async(&mut con)
            .await?;

        // Redis signals the end of an iteration with cursor 0
        let next = (next != 0).then(|| next.to_string());
        Ok(ScanPage { keys, next })
    }
}
