/// Crawl job status definitions
///
/// A job starts as `Pending` and ends in exactly one terminal status.
use std::fmt;

/// Represents the lifecycle status of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Queued, waiting to be fetched
    Pending,

    /// Fetched and persisted to the artifact sink
    Success,

    /// Navigation, capture, or persistence failed
    Failed,
}

impl JobStatus {
    /// Returns true if no further transition is expected
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// Converts the status to the string stored in job records
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a status from its stored string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "SUCCESS" => Some(Self::Success),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Key namespace holding records of this status
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Self::Pending => "pending_job:",
            Self::Success => "success_job:",
            Self::Failed => "failed_job:",
        }
    }

    /// Returns all statuses
    pub fn all() -> [Self; 3] {
        [Self::Pending, Self::Success, Self::Failed]
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}
