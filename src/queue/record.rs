//! Serialized form of a crawl job

use crate::job::{CrawlJob, JobError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job record as stored in the key-value backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub url: String,
    pub status: String,
    /// When this record was written; informational only
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn from_job(job: &CrawlJob) -> Self {
        Self {
            id: job.id().to_string(),
            url: job.url().to_string(),
            status: job.status().to_db_string().to_string(),
            recorded_at: Utc::now(),
        }
    }

    /// Rebuilds the job, validating every field
    pub fn into_job(self) -> Result<CrawlJob, JobError> {
        CrawlJob::reconstruct(&self.id, &self.url, &self.status)
    }
}
