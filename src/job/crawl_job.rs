use crate::job::{JobError, JobStatus};
use crate::url::{check_fetchable, parse_absolute};
use url::Url;
use uuid::Uuid;

/// One unit of work: fetch a URL and persist its rendered content
///
/// A job is identified by its URL; the surrogate id only names the stored
/// artifact. Values are disposable copies of what the queue store holds, so
/// a status change produces a new value via [`CrawlJob::with_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJob {
    id: Uuid,
    url: Url,
    status: JobStatus,
}

impl CrawlJob {
    /// Creates a new pending job, validating the URL
    pub fn new(raw_url: &str) -> Result<Self, JobError> {
        let url = parse_absolute(raw_url)?;
        Ok(Self::pending(url))
    }

    /// Creates a new pending job from an already parsed URL
    pub fn from_url(url: Url) -> Result<Self, JobError> {
        check_fetchable(&url)?;
        Ok(Self::pending(url))
    }

    fn pending(url: Url) -> Self {
        Self {
            id: Uuid::new_v4(),
            url,
            status: JobStatus::Pending,
        }
    }

    /// Rebuilds a job from its persisted fields
    ///
    /// Rejects malformed ids, malformed URLs, and unknown status strings.
    pub fn reconstruct(id: &str, url: &str, status: &str) -> Result<Self, JobError> {
        let id = Uuid::parse_str(id).map_err(|_| JobError::InvalidId(id.to_string()))?;
        let url = parse_absolute(url)?;
        let status =
            JobStatus::from_db_string(status).ok_or_else(|| JobError::InvalidStatus(status.to_string()))?;
        Ok(Self { id, url, status })
    }

    /// Returns a copy of this job carrying a different status
    pub fn with_status(&self, status: JobStatus) -> Self {
        Self {
            id: self.id,
            url: self.url.clone(),
            status,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// File name under which the captured HTML is stored
    pub fn artifact_name(&self) -> String {
        format!("{}.html", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_pending() {
        let job = CrawlJob::new("https://jobs.example.com/job/1").unwrap();
        assert_eq!(job.status(), JobStatus::Pending);
        assert_eq!(job.url().as_str(), "https://jobs.example.com/job/1");
        assert_eq!(job.artifact_name(), format!("{}.html", job.id()));
    }

    #[test]
    fn test_new_rejects_invalid_urls() {
        assert!(CrawlJob::new("").is_err());
        assert!(CrawlJob::new("/job/1").is_err());
        assert!(CrawlJob::new("ftp://jobs.example.com/job/1").is_err());
        assert!(CrawlJob::new("javascript:void(0)").is_err());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = CrawlJob::new("https://jobs.example.com/job/1").unwrap();
        let b = CrawlJob::new("https://jobs.example.com/job/1").unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_with_status_keeps_identity() {
        let job = CrawlJob::new("https://jobs.example.com/job/1").unwrap();
        let done = job.with_status(JobStatus::Success);

        assert_eq!(done.id(), job.id());
        assert_eq!(done.url(), job.url());
        assert_eq!(done.status(), JobStatus::Success);
        assert_eq!(job.status(), JobStatus::Pending);
    }

    #[test]
    fn test_reconstruct() {
        let id = Uuid::new_v4().to_string();
        let job = CrawlJob::reconstruct(&id, "https://jobs.example.com/job/1", "FAILED").unwrap();
        assert_eq!(job.id().to_string(), id);
        assert_eq!(job.status(), JobStatus::Failed);
    }

    #[test]
    fn test_reconstruct_rejects_bad_fields() {
        let id = Uuid::new_v4().to_string();

        assert!(matches!(
            CrawlJob::reconstruct("not-a-uuid", "https://jobs.example.com/", "PENDING"),
            Err(JobError::InvalidId(_))
        ));
        assert!(matches!(
            CrawlJob::reconstruct(&id, "jobs.example.com", "PENDING"),
            Err(JobError::InvalidUrl(_))
        ));
        assert!(matches!(
            CrawlJob::reconstruct(&id, "https://jobs.example.com/", "DONE"),
            Err(JobError::InvalidStatus(_))
        ));
    }
}
