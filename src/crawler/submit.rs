//! Bounded concurrent job submission
//!
//! Links extracted from one listing page are resolved, de-duplicated and
//! enqueued by a small pool of tasks. A URL that already has a record under
//! any status is left alone, so submitting the same listing twice is harmless.

use crate::job::{CrawlJob, JobStatus};
use crate::queue::JobQueue;
use crate::url::resolve_against;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};
use url::Url;

/// Counts from one or more submission rounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitReport {
    /// New PENDING jobs written
    pub submitted: usize,
    /// URLs that already had a record
    pub duplicates: usize,
    /// Links that did not resolve to a fetchable URL
    pub rejected: usize,
    /// Store failures
    pub failed: usize,
    /// Submission stopped early on cancellation
    pub cancelled: bool,
}

impl SubmitReport {
    pub fn merge(&mut self, other: SubmitReport) {
        self.submitted += other.submitted;
        self.duplicates += other.duplicates;
        self.rejected += other.rejected;
        self.failed += other.failed;
        self.cancelled |= other.cancelled;
    }
}

enum Outcome {
    Submitted,
    Duplicate,
    Rejected,
    Failed,
    Skipped,
}

/// Enqueues crawl jobs with bounded parallelism
#[derive(Clone)]
pub struct Submitter {
    queue: Arc<JobQueue>,
    concurrency: usize,
    cancel: CancellationToken,
}

impl Submitter {
    pub fn new(queue: Arc<JobQueue>, concurrency: usize, cancel: CancellationToken) -> Self {
        Self {
            queue,
            concurrency: concurrency.max(1),
            cancel,
        }
    }

    /// True once the shared cancellation token has fired
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves `links` against `base` and submits every distinct result
    ///
    /// Resolution failures are logged and counted as rejected. Store failures
    /// on individual jobs are logged and counted; they never abort the round.
    pub async fn submit_links(&self, base: &Url, links: &[String]) -> SubmitReport {
        let mut report = SubmitReport::default();
        let mut seen = HashSet::new();
        let mut urls = Vec::with_capacity(links.len());

        for link in links {
            match resolve_against(base, link) {
                Ok(url) => {
                    if seen.insert(url.clone()) {
                        urls.push(url);
                    }
                }
                Err(e) => {
                    warn!("Skipping link '{}' on {}: {}", link, base, e);
                    report.rejected += 1;
                }
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for url in urls {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                permit = semaphore.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                report.cancelled = true;
                break;
            };

            let queue = Arc::clone(&self.queue);
            let cancel = self.cancel.clone();
            tasks.spawn(async move {
                let _permit = permit;
                if cancel.is_cancelled() {
                    return Outcome::Skipped;
                }
                submit(&queue, url).await
            });
        }

        // In-flight submissions always run to completion
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Outcome::Submitted) => report.submitted += 1,
                Ok(Outcome::Duplicate) => report.duplicates += 1,
                Ok(Outcome::Rejected) => report.rejected += 1,
                Ok(Outcome::Failed) => report.failed += 1,
                Ok(Outcome::Skipped) => report.cancelled = true,
                Err(e) => {
                    error!("Submission task failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        debug!(
            "Submitted {} jobs ({} duplicates, {} rejected, {} failed)",
            report.submitted, report.duplicates, report.rejected, report.failed
        );
        report
    }
}

/// Enqueues one URL unless it is already known
async fn submit(queue: &JobQueue, url: Url) -> Outcome {
    let job = match CrawlJob::from_url(url) {
        Ok(job) => job,
        Err(e) => {
            warn!("Not enqueueing: {}", e);
            return Outcome::Rejected;
        }
    };

    match queue.exists_any(job.url()).await {
        Ok(Some(status)) => {
            trace!("{} already recorded as {}", job.url(), status);
            return Outcome::Duplicate;
        }
        Ok(None) => {}
        Err(e) => {
            warn!("Existence check for {} failed: {}", job.url(), e);
            return Outcome::Failed;
        }
    }

    match queue.save(&job).await {
        Ok(()) => {
            trace!("Enqueued {} as {}", job.url(), JobStatus::Pending);
            Outcome::Submitted
        }
        Err(e) => {
            warn!("Failed to enqueue {}: {}", job.url(), e);
            Outcome::Failed
        }
    }
}
