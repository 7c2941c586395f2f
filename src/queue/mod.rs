//! Durable crawl job queue
//!
//! Jobs are stored one record per key, `<status prefix><url>`, in any
//! [`KvStore`]. A URL is considered known as soon as a record exists under any
//! of the three status prefixes.

mod record;

pub use record::JobRecord;

use crate::job::{CrawlJob, JobStatus};
use crate::storage::{KvStore, StoreError};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

/// Errors raised by queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Scan of '{prefix}' failed: {source}")]
    Scan {
        prefix: String,
        #[source]
        source: StoreError,
    },

    #[error("Malformed record '{key}': {reason}")]
    Record { key: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Builds the store key for a job with `status` and `url`
pub fn job_key(status: JobStatus, url: &Url) -> String {
    format!("{}{}", status.key_prefix(), url)
}

/// Queue of crawl jobs over a key-value store
#[derive(Clone)]
pub struct JobQueue {
    store: Arc<dyn KvStore>,
}

impl JobQueue {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Writes the job under its current status, replacing any previous record
    pub async fn save(&self, job: &CrawlJob) -> QueueResult<()> {
        let key = job_key(job.status(), job.url());
        let value = serde_json::to_string(&JobRecord::from_job(job))?;
        self.store.set(&key, &value).await?;
        debug!("Saved {}", key);
        Ok(())
    }

    /// Removes the record for the job's current status
    pub async fn delete(&self, job: &CrawlJob) -> QueueResult<()> {
        let key = job_key(job.status(), job.url());
        self.store.delete(&key).await?;
        Ok(())
    }

    /// Returns true if a record exists for the job's URL under its status
    pub async fn exists(&self, job: &CrawlJob) -> QueueResult<bool> {
        Ok(self.store.exists(&job_key(job.status(), job.url())).await?)
    }

    /// Returns the first status under which `url` has a record
    pub async fn exists_any(&self, url: &Url) -> QueueResult<Option<JobStatus>> {
        for status in JobStatus::all() {
            if self.store.exists(&job_key(status, url)).await? {
                return Ok(Some(status));
            }
        }
        Ok(None)
    }

    /// Moves a job to a new status
    ///
    /// Deletes the old record, then writes the new one. The two writes are not
    /// atomic: if the second fails the job is orphaned, which is logged and
    /// reported but not repaired.
    pub async fn transition(&self, job: &CrawlJob, to: JobStatus) -> QueueResult<CrawlJob> {
        let next = job.with_status(to);
        self.delete(job).await?;

        if let Err(e) = self.save(&next).await {
            error!(
                "Job {} ({}) orphaned: removed from {} but not written as {}: {}",
                job.id(),
                job.url(),
                job.status(),
                to,
                e
            );
            return Err(e);
        }

        Ok(next)
    }

    /// Counts the records currently held under `status`
    pub async fn count_by_status(&self, status: JobStatus) -> QueueResult<u64> {
        let prefix = status.key_prefix();
        let mut cursor = None;
        let mut total = 0u64;

        loop {
            let page = self
                .store
                .scan_prefix(prefix, cursor, 500)
                .await
                .map_err(|source| QueueError::Scan {
                    prefix: prefix.to_string(),
                    source,
                })?;
            total += page.keys.len() as u64;
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(total)
    }

    /// Lazily enumerates every job stored under `status`
    ///
    /// At most `batch_size` keys are buffered at a time. A malformed record
    /// yields an `Err` item and enumeration continues; a failing scan yields
    /// one `Err` item and ends the stream.
    pub fn find_by_status(
        &self,
        status: JobStatus,
        batch_size: usize,
    ) -> BoxStream<'static, QueueResult<CrawlJob>> {
        let state = ScanState {
            store: Arc::clone(&self.store),
            status,
            batch_size: batch_size.max(1),
            cursor: None,
            buffered: VecDeque::new(),
            exhausted: false,
        };

        stream::unfold(state, |mut state| async move {
            loop {
                if let Some(key) = state.buffered.pop_front() {
                    match state.load(&key).await {
                        Ok(Some(job)) => return Some((Ok(job), state)),
                        // Removed since the scan saw it
                        Ok(None) => continue,
                        Err(e) => return Some((Err(e), state)),
                    }
                }

                if state.exhausted {
                    return None;
                }

                let prefix = state.status.key_prefix();
                match state
                    .store
                    .scan_prefix(prefix, state.cursor.take(), state.batch_size)
                    .await
                {
                    Ok(page) => {
                        state.exhausted = page.next.is_none();
                        state.cursor = page.next;
                        state.buffered.extend(page.keys);
                    }
                    Err(source) => {
                        state.exhausted = true;
                        let err = QueueError::Scan {
                            prefix: prefix.to_string(),
                            source,
                        };
                        return Some((Err(err), state));
                    }
                }
            }
        })
        .boxed()
    }
}

struct ScanState {
    store: Arc<dyn KvStore>,
    status: JobStatus,
    batch_size: usize,
    cursor: Option<String>,
    buffered: VecDeque<String>,
    exhausted: bool,
}

impl ScanState {
    async fn load(&self, key: &str) -> QueueResult<Option<CrawlJob>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };

        let malformed = |reason: String| QueueError::Record {
            key: key.to_string(),
            reason,
        };

        let record: JobRecord = serde_json::from_str(&raw).map_err(|e| malformed(e.to_string()))?;
        let job = record.into_job().map_err(|e| malformed(e.to_string()))?;

        if job.status() != self.status {
            return Err(malformed(format!(
                "status {} stored under {} prefix",
                job.status(),
                self.status
            )));
        }

        Ok(Some(job))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, ScanPage, StoreResult};
    use async_trait::async_trait;
    use futures::TryStreamExt;

    fn queue() -> (JobQueue, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (JobQueue::new(store.clone()), store)
    }

    fn job(path: &str) -> CrawlJob {
        CrawlJob::new(&format!("https://jobs.example.com{}", path)).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_exists() {
        let (queue, _) = queue();
        let job = job("/job/1");

        assert!(!queue.exists(&job).await.unwrap());
        queue.save(&job).await.unwrap();

        assert!(queue.exists(&job).await.unwrap());
        assert_eq!(
            queue.exists_any(job.url()).await.unwrap(),
            Some(JobStatus::Pending)
        );
        assert!(!queue.exists(&job.with_status(JobStatus::Success)).await.unwrap());
    }

    #[tokio::test]
    async fn test_key_layout() {
        let (queue, store) = queue();
        let job = job("/job/1");
        queue.save(&job).await.unwrap();

        assert!(store
            .exists("pending_job:https://jobs.example.com/job/1")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_transition_moves_record() {
        let (queue, store) = queue();
        let pending = job("/job/1");
        queue.save(&pending).await.unwrap();

        let done = queue.transition(&pending, JobStatus::Success).await.unwrap();

        assert_eq!(done.id(), pending.id());
        assert!(!queue.exists(&pending).await.unwrap());
        assert!(queue.exists(&done).await.unwrap());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_status_streams_every_job() {
        let (queue, _) = queue();
        for i in 0..7 {
            queue.save(&job(&format!("/job/{}", i))).await.unwrap();
        }
        queue
            .save(&job("/job/done").with_status(JobStatus::Success))
            .await
            .unwrap();

        let jobs: Vec<CrawlJob> = queue
            .find_by_status(JobStatus::Pending, 3)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(jobs.len(), 7);
        assert!(jobs.iter().all(|j| j.status() == JobStatus::Pending));
    }

    #[tokio::test]
    async fn test_find_by_status_reports_malformed_and_continues() {
        let (queue, store) = queue();
        queue.save(&job("/job/a")).await.unwrap();
        store
            .set("pending_job:https://jobs.example.com/job/b", "not json")
            .await
            .unwrap();
        queue.save(&job("/job/c")).await.unwrap();

        let items: Vec<_> = queue.find_by_status(JobStatus::Pending, 2).collect().await;

        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(QueueError::Record { .. })));
        assert!(items[2].is_ok());
    }

    #[tokio::test]
    async fn test_find_by_status_rejects_status_mismatch() {
        let (queue, store) = queue();
        let failed = job("/job/x").with_status(JobStatus::Failed);
        let value = serde_json::to_string(&JobRecord::from_job(&failed)).unwrap();
        store
            .set("pending_job:https://jobs.example.com/job/x", &value)
            .await
            .unwrap();

        let items: Vec<_> = queue.find_by_status(JobStatus::Pending, 10).collect().await;

        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(QueueError::Record { .. })));
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let (queue, _) = queue();
        for i in 0..3 {
            queue.save(&job(&format!("/job/{}", i))).await.unwrap();
        }
        queue
            .save(&job("/job/f").with_status(JobStatus::Failed))
            .await
            .unwrap();

        assert_eq!(queue.count_by_status(JobStatus::Pending).await.unwrap(), 3);
        assert_eq!(queue.count_by_status(JobStatus::Failed).await.unwrap(), 1);
        assert_eq!(queue.count_by_status(JobStatus::Success).await.unwrap(), 0);
    }

    struct BrokenStore;

    #[async_trait]
    impl KvStore for BrokenStore {
        async fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
            Ok(())
        }

        async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> StoreResult<()> {
            Ok(())
        }

        async fn exists(&self, _key: &str) -> StoreResult<bool> {
            Ok(false)
        }

        async fn scan_prefix(
            &self,
            _prefix: &str,
            _cursor: Option<String>,
            _count: usize,
        ) -> StoreResult<ScanPage> {
            Err(StoreError::Database("connection reset".to_string()))
        }
    }

    #[tokio::test]
    async fn test_scan_failure_ends_stream() {
        let queue = JobQueue::new(Arc::new(BrokenStore));

        let items: Vec<_> = queue.find_by_status(JobStatus::Pending, 10).collect().await;

        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(QueueError::Scan { .. })));
    }
}
