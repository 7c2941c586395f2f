//! Statistics over the job queue
//!
//! This module counts queue records per status and prints a short report.

use crate::job::JobStatus;
use crate::queue::{JobQueue, QueueResult};
use std::collections::HashMap;

/// Queue statistics summary
#[derive(Debug, Clone, Default)]
pub struct QueueStatistics {
    /// Total number of job records across all statuses
    pub total_jobs: u64,

    /// Count of records by status
    pub jobs_by_status: HashMap<JobStatus, u64>,
}

impl QueueStatistics {
    pub fn count(&self, status: JobStatus) -> u64 {
        self.jobs_by_status.get(&status).copied().unwrap_or(0)
    }

    /// Share of finished jobs that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        let succeeded = self.count(JobStatus::Success);
        let finished: u64 = JobStatus::all()
            .into_iter()
            .filter(JobStatus::is_terminal)
            .map(|status| self.count(status))
            .sum();
        if finished == 0 {
            0.0
        } else {
            (succeeded as f64 / finished as f64) * 100.0
        }
    }
}

/// Loads statistics from the queue
///
/// # Arguments
///
/// * `queue` - The job queue to count
///
/// # Returns
///
/// * `Ok(QueueStatistics)` - Successfully counted every status
/// * `Err(QueueError)` - A scan failed
pub async fn load_statistics(queue: &JobQueue) -> QueueResult<QueueStatistics> {
    let mut stats = QueueStatistics::default();

    for status in JobStatus::all() {
        let count = queue.count_by_status(status).await?;
        stats.total_jobs += count;
        stats.jobs_by_status.insert(status, count);
    }

    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &QueueStatistics) {
    println!("=== Queue Statistics ===\n");

    println!("Jobs by Status:");
    for status in JobStatus::all() {
        let count = stats.count(status);
        let percentage = if stats.total_jobs > 0 {
            (count as f64 / stats.total_jobs as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} succeeded, {} failed)",
        stats.success_rate(),
        stats.count(JobStatus::Success),
        stats.count(JobStatus::Failed)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::CrawlJob;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_success_rate() {
        let mut stats = QueueStatistics::default();
        assert_eq!(stats.success_rate(), 0.0);

        stats.jobs_by_status.insert(JobStatus::Success, 3);
        stats.jobs_by_status.insert(JobStatus::Failed, 1);
        stats.jobs_by_status.insert(JobStatus::Pending, 10);

        assert_eq!(stats.success_rate(), 75.0);
    }

    #[tokio::test]
    async fn test_load_statistics() {
        let queue = JobQueue::new(Arc::new(MemoryStore::new()));
        for i in 0..4 {
            let job = CrawlJob::new(&format!("https://jobs.example.com/job/{}", i)).unwrap();
            queue.save(&job).await.unwrap();
        }
        let done = CrawlJob::new("https://jobs.example.com/job/done").unwrap();
        queue.save(&done.with_status(JobStatus::Success)).await.unwrap();

        let stats = load_statistics(&queue).await.unwrap();

        assert_eq!(stats.total_jobs, 5);
        assert_eq!(stats.count(JobStatus::Pending), 4);
        assert_eq!(stats.count(JobStatus::Success), 1);
        assert_eq!(stats.count(JobStatus::Failed), 0);
    }
}
