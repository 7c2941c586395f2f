//! Job execution
//!
//! Drains PENDING jobs in batches: each job's page is loaded, captured and
//! written to the artifact sink, then the job moves to SUCCESS. A failing job
//! gets a FAILED record and keeps its PENDING one, so a later pass retries it.

use crate::browser::Session;
use crate::config::Config;
use crate::crawler::pause;
use crate::job::{CrawlJob, JobStatus};
use crate::output::ArtifactSink;
use crate::queue::{JobQueue, QueueError};
use crate::CrawlError;
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of a drain pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Jobs attempted
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Distinct unreadable PENDING records passed over
    pub skipped_records: usize,
    pub batches: usize,
    /// The pass stopped early on cancellation
    pub cancelled: bool,
}

/// Drains the PENDING queue
pub struct Executor {
    config: Arc<Config>,
    session: Session,
    queue: Arc<JobQueue>,
    sink: Arc<dyn ArtifactSink>,
    cancel: CancellationToken,
}

impl Executor {
    pub fn new(
        config: Arc<Config>,
        session: Session,
        queue: Arc<JobQueue>,
        sink: Arc<dyn ArtifactSink>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            session,
            queue,
            sink,
            cancel,
        }
    }

    /// Processes batches until no unattempted PENDING job remains
    ///
    /// Every job is attempted at most once per pass. Individual job failures
    /// are recorded and never abort the pass; a failing queue scan does.
    pub async fn execute(&mut self) -> Result<ExecutionSummary, CrawlError> {
        let mut summary = ExecutionSummary::default();
        let mut attempted: HashSet<String> = HashSet::new();
        let mut unreadable: HashSet<String> = HashSet::new();

        let result = self
            .drain(&mut summary, &mut attempted, &mut unreadable)
            .await;

        if let Err(e) = self.session.close().await {
            warn!("Failed to close browser: {}", e);
        }
        result?;

        info!(
            "Execution finished: {} processed, {} succeeded, {} failed in {} batches",
            summary.processed, summary.succeeded, summary.failed, summary.batches
        );
        Ok(summary)
    }

    async fn drain(
        &mut self,
        summary: &mut ExecutionSummary,
        attempted: &mut HashSet<String>,
        unreadable: &mut HashSet<String>,
    ) -> Result<(), CrawlError> {
        loop {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                return Ok(());
            }

            let batch = self.next_batch(attempted, unreadable).await?;
            summary.skipped_records = unreadable.len();
            if batch.is_empty() {
                info!("No pending jobs left");
                return Ok(());
            }

            summary.batches += 1;
            info!("Batch {}: {} jobs", summary.batches, batch.len());

            for job in batch {
                if self.cancel.is_cancelled() {
                    summary.cancelled = true;
                    return Ok(());
                }

                attempted.insert(job.url().to_string());
                summary.processed += 1;

                match self.process(&job).await {
                    Ok(()) => {
                        summary.succeeded += 1;
                        debug!("Captured {} as {}", job.url(), job.artifact_name());
                    }
                    Err(e) => {
                        summary.failed += 1;
                        warn!("Job {} failed: {}", job.url(), e);
                        self.queue.save(&job.with_status(JobStatus::Failed)).await?;
                    }
                }
            }

            if !pause(&self.cancel, self.config.crawler.batch_interval()).await {
                summary.cancelled = true;
                return Ok(());
            }
        }
    }

    /// Collects up to `batch-size` PENDING jobs not yet attempted in this pass
    async fn next_batch(
        &self,
        attempted: &HashSet<String>,
        unreadable: &mut HashSet<String>,
    ) -> Result<Vec<CrawlJob>, CrawlError> {
        let batch_size = self.config.crawler.batch_size.max(1);
        let mut stream = self.queue.find_by_status(JobStatus::Pending, batch_size);
        let mut batch = Vec::with_capacity(batch_size);

        while let Some(item) = stream.next().await {
            match item {
                Ok(job) if attempted.contains(job.url().as_str()) => {}
                Ok(job) => {
                    batch.push(job);
                    if batch.len() >= batch_size {
                        break;
                    }
                }
                Err(e @ QueueError::Scan { .. }) => return Err(e.into()),
                Err(QueueError::Record { key, reason }) => {
                    if unreadable.insert(key.clone()) {
                        warn!("Skipping unreadable record {}: {}", key, reason);
                    }
                }
                Err(e) => warn!("Skipping pending record: {}", e),
            }
        }

        Ok(batch)
    }

    /// Loads, captures and stores one job, then marks it SUCCESS
    async fn process(&mut self, job: &CrawlJob) -> Result<(), CrawlError> {
        self.session.navigate(job.url()).await?;

        if let Some(tab) = self.config.selector.tab_click.as_deref() {
            if let Err(e) = self.session.click(tab).await {
                warn!("Tab '{}' on {} not clicked: {}", tab, job.url(), e);
            }
        }

        let html = self.session.html().await?;
        self.sink.save_html(&job.artifact_name(), &html).await?;

        self.queue.transition(job, JobStatus::Success).await?;

        // A failure from an earlier pass is now stale
        if let Err(e) = self.queue.delete(&job.with_status(JobStatus::Failed)).await {
            warn!("Stale FAILED record for {} not removed: {}", job.url(), e);
        }
        Ok(())
    }
}
