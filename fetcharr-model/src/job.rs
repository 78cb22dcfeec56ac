use crate::enums::JobStatus;
use crate::ids::JobId;
use serde::{Deserialize, Serialize};

/// §3/§4.L `Job`: a unit of asynchronous work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Job {
    pub id: JobId,
    pub job_type: String,
    /// `1` highest priority ... `10` lowest, per the §4.L priority table.
    pub priority: i16,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub payload: serde_json::Value,
    pub status: JobStatus,
    pub retry_count: i32,
    pub max_retries: i32,
    pub next_retry_at: Option<chrono::DateTime<chrono::Utc>>,
    pub parent_job_id: Option<JobId>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub depends_on: Vec<JobId>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub progress: JobProgress,
    pub error_message: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// §4.L `UpdateProgress` payload shape; ephemeral, broadcast rather than
/// persisted on every tick, but the last known value is kept on the row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    pub current: i64,
    pub total: i64,
    pub message: Option<String>,
    pub detail: Option<serde_json::Value>,
}

impl Job {
    pub fn new(job_type: impl Into<String>, priority: i16, payload: serde_json::Value) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: JobId::new(),
            job_type: job_type.into(),
            priority,
            payload,
            status: JobStatus::Pending,
            retry_count: 0,
            max_retries: 3,
            next_retry_at: None,
            parent_job_id: None,
            depends_on: Vec::new(),
            progress: JobProgress::default(),
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn child_of(mut self, parent: JobId) -> Self {
        self.parent_job_id = Some(parent);
        self
    }

    pub fn depending_on(mut self, deps: impl IntoIterator<Item = JobId>) -> Self {
        self.depends_on = deps.into_iter().collect();
        self
    }

    pub fn with_max_retries(mut self, max_retries: i32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// §4.L retry formula: `base * 2^retry_count`, capped.
    pub fn backoff_delay(&self, base: chrono::Duration, cap: chrono::Duration) -> chrono::Duration {
        let scaled = base * 2i32.saturating_pow(self.retry_count.max(0) as u32);
        scaled.min(cap)
    }

    /// §3/§4.L state transition: `pending -> processing`.
    pub fn start(&mut self) {
        self.status = JobStatus::Processing;
        self.updated_at = chrono::Utc::now();
    }

    pub fn complete(&mut self) {
        self.status = JobStatus::Completed;
        self.updated_at = chrono::Utc::now();
    }

    /// §4.L: on handler failure, retry if under the cap, else fail terminally.
    pub fn fail(&mut self, message: impl Into<String>, base: chrono::Duration, cap: chrono::Duration) {
        self.error_message = Some(message.into());
        if self.retry_count < self.max_retries {
            let delay = self.backoff_delay(base, cap);
            self.retry_count += 1;
            self.next_retry_at = Some(chrono::Utc::now() + delay);
            self.status = JobStatus::Pending;
        } else {
            self.status = JobStatus::Failed;
        }
        self.updated_at = chrono::Utc::now();
    }

    pub fn cancel(&mut self) {
        self.status = JobStatus::Cancelled;
        self.updated_at = chrono::Utc::now();
    }

    /// §4.L crash recovery: any row left `processing` across a restart is
    /// reset to `pending` with its retry count untouched.
    pub fn recover_from_crash(&mut self) {
        if matches!(self.status, JobStatus::Processing) {
            self.status = JobStatus::Pending;
            self.updated_at = chrono::Utc::now();
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }
}

/// A terminal job moved into the capped, append-only history table (§4.L).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct JobHistoryEntry {
    pub id: JobId,
    pub job_type: String,
    pub status: JobStatus,
    pub duration_ms: i64,
    pub retry_count: i32,
    pub error_message: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_count_increments_until_max_then_fails_terminally() {
        let mut job = Job::new("enrich-metadata", 6, serde_json::json!({})).with_max_retries(2);
        job.start();
        job.fail("boom", chrono::Duration::seconds(1), chrono::Duration::minutes(5));
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.retry_count, 1);

        job.start();
        job.fail("boom", chrono::Duration::seconds(1), chrono::Duration::minutes(5));
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.retry_count, 2);

        job.start();
        job.fail("boom", chrono::Duration::seconds(1), chrono::Duration::minutes(5));
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.retry_count, 2);
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        let mut job = Job::new("publish", 4, serde_json::json!({}));
        let base = chrono::Duration::seconds(1);
        let cap = chrono::Duration::seconds(10);
        assert_eq!(job.backoff_delay(base, cap), chrono::Duration::seconds(1));
        job.retry_count = 3;
        assert_eq!(job.backoff_delay(base, cap), chrono::Duration::seconds(8));
        job.retry_count = 10;
        assert_eq!(job.backoff_delay(base, cap), cap);
    }

    #[test]
    fn crash_recovery_resets_processing_to_pending_and_keeps_retry_count() {
        let mut job = Job::new("directory-scan", 2, serde_json::json!({}));
        job.retry_count = 2;
        job.start();
        job.recover_from_crash();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.retry_count, 2);
    }
}
