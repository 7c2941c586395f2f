//! Job generation
//!
//! Visits every listing page (seed) and runs the configured pagination
//! strategy on it, filling the queue with PENDING jobs.

use crate::browser::Session;
use crate::config::{Config, SeedMode};
use crate::crawler::pause;
use crate::crawler::strategy::run_strategy;
use crate::crawler::submit::{SubmitReport, Submitter};
use crate::queue::JobQueue;
use crate::url::{parse_absolute, resolve_against};
use crate::{ConfigError, CrawlError};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use url::Url;

/// Outcome of a generation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Listing pages found
    pub seeds: usize,
    pub seeds_processed: usize,
    pub seeds_failed: usize,
    /// New PENDING jobs written
    pub jobs_created: usize,
    /// Jobs skipped because their URL was already recorded
    pub duplicates: usize,
    /// The pass stopped early on cancellation
    pub cancelled: bool,
}

/// Fills the queue from the configured listing pages
pub struct Generator {
    config: Arc<Config>,
    session: Session,
    submitter: Submitter,
    cancel: CancellationToken,
}

impl Generator {
    pub fn new(
        config: Arc<Config>,
        session: Session,
        queue: Arc<JobQueue>,
        cancel: CancellationToken,
    ) -> Self {
        let submitter = Submitter::new(queue, config.crawler.concurrency, cancel.clone());
        Self {
            config,
            session,
            submitter,
            cancel,
        }
    }

    /// Runs one generation pass over every seed
    ///
    /// A seed that fails is logged and skipped. The pass fails only when
    /// there are no seeds at all, or when every seed failed.
    pub async fn generate(&mut self) -> Result<GenerationSummary, CrawlError> {
        let base = parse_absolute(&self.config.crawler.base_url)?;
        let seeds = self.collect_seeds(&base).await;

        let mut summary = GenerationSummary {
            seeds: seeds.len(),
            ..Default::default()
        };

        if seeds.is_empty() {
            self.close().await;
            return Err(CrawlError::NoSeeds);
        }
        info!("Generating jobs from {} listing pages", seeds.len());

        for (index, raw) in seeds.iter().enumerate() {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let seed = match resolve_against(&base, raw) {
                Ok(seed) => seed,
                Err(e) => {
                    warn!("Skipping listing page '{}': {}", raw, e);
                    summary.seeds_failed += 1;
                    continue;
                }
            };

            info!("[{}/{}] Listing {}", index + 1, seeds.len(), seed);
            let mut report = SubmitReport::default();
            let result = self.crawl_listing(&seed, &mut report).await;

            summary.jobs_created += report.submitted;
            summary.duplicates += report.duplicates;
            match result {
                Ok(()) => {
                    summary.seeds_processed += 1;
                    info!(
                        "Listing {} done: {} new jobs, {} already known",
                        seed, report.submitted, report.duplicates
                    );
                }
                Err(e) => {
                    summary.seeds_failed += 1;
                    warn!("Listing {} failed: {}", seed, e);
                }
            }

            if report.cancelled {
                summary.cancelled = true;
                break;
            }

            let last = index + 1 == seeds.len();
            if !last && !pause(&self.cancel, self.config.crawler.sleep()).await {
                summary.cancelled = true;
                break;
            }
        }

        self.close().await;

        if summary.cancelled {
            info!("Generation cancelled");
        } else if summary.seeds_processed == 0 {
            error!("All {} listing pages failed", summary.seeds);
            return Err(CrawlError::AllSeedsFailed {
                seeds: summary.seeds,
            });
        }

        info!(
            "Generation finished: {} jobs created from {}/{} listing pages",
            summary.jobs_created, summary.seeds_processed, summary.seeds
        );
        Ok(summary)
    }

    /// Listing pages to visit, in order and without repeats
    async fn collect_seeds(&mut self, base: &Url) -> Vec<String> {
        let seeds = match self.config.crawler.seed_mode {
            SeedMode::Manual => self.config.crawler.urls.clone(),
            SeedMode::Auto => match self.discover_seeds(base).await {
                Ok(seeds) => seeds,
                Err(e) => {
                    warn!("Could not collect listing pages from {}: {}", base, e);
                    Vec::new()
                }
            },
        };

        let mut seen = HashSet::new();
        seeds
            .into_iter()
            .filter(|seed| seen.insert(seed.clone()))
            .collect()
    }

    async fn discover_seeds(&mut self, base: &Url) -> Result<Vec<String>, CrawlError> {
        let selector = self.config.selector.list_links.as_deref().ok_or_else(|| {
            ConfigError::Validation("selector.list-links is not configured".to_string())
        })?;

        self.session.navigate(base).await?;
        let links = self.session.extract_attribute(selector, "href").await?;
        info!("Found {} listing links on {}", links.len(), base);
        Ok(links)
    }

    async fn crawl_listing(
        &mut self,
        seed: &Url,
        report: &mut SubmitReport,
    ) -> Result<(), CrawlError> {
        self.session.navigate(seed).await?;
        run_strategy(&mut self.session, &self.config, &self.submitter, report).await
    }

    async fn close(&mut self) {
        if let Err(e) = self.session.close().await {
            warn!("Failed to close browser: {}", e);
        }
    }
}
