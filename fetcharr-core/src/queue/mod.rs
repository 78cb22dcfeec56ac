//! §4.L priority job queue: the central scheduling primitive every handler
//! (scan, enrichment, publish, notify, verify, GC) runs under. Grounded on
//! `scan_teacher_ref/orchestration/dispatcher.rs`'s `JobDispatcher` trait
//! and `DispatchStatus` enum (`Success`/`Retry`/`DeadLetter`), retargeted
//! from that file's actor-per-stage dispatch onto a flat `job_type`
//! registry, and on `failsafe`'s consecutive-failure circuit breaker
//! already adopted in `crate::http` for the queue-wide breaker.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use failsafe::{Config, StateMachine, backoff, failure_policy};
use tracing::{error, info, warn};

use fetcharr_model::{Job, JobId, JobHistoryEntry};

use crate::error::Result;
use crate::events::{Event, EventBus};

/// Persistence surface the queue needs; implemented against Postgres in
/// `crate::db`. Kept minimal and storage-agnostic so `queue::` never
/// depends on `sqlx` directly.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn insert(&self, job: &Job) -> Result<()>;
    async fn fetch(&self, id: JobId) -> Result<Option<Job>>;
    /// §4.L selection: next `pending` job whose retry delay has elapsed and
    /// whose dependencies are all `completed`, ordered by ascending
    /// priority then ascending `created_at`.
    async fn claim_next_runnable(&self) -> Result<Option<Job>>;
    async fn update(&self, job: &Job) -> Result<()>;
    async fn children_of(&self, parent: JobId) -> Result<Vec<Job>>;
    /// §4.L crash recovery: every `processing` row reset to `pending`.
    async fn recover_crashed(&self) -> Result<u64>;
    async fn move_to_history(&self, job: &Job, duration_ms: i64) -> Result<()>;
}

/// One entry in the §4.L type registry. Unknown `job_type`s fail terminally
/// with a diagnostic rather than retrying forever.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job, ctx: &JobContext) -> Result<()>;
}

/// Passed to every handler so it can report progress, publish activity, and
/// check cooperative cancellation without depending on the queue itself.
pub struct JobContext {
    pub events: Arc<EventBus>,
    job_id: JobId,
}

impl JobContext {
    pub fn report_progress(&self, current: u64, total: Option<u64>, message: Option<String>) {
        self.events.publish(Event::JobProgress { job_id: self.job_id, current, total, message });
    }
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, job_type: impl Into<String>, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(job_type.into(), handler);
    }

    pub fn get(&self, job_type: &str) -> Option<&Arc<dyn JobHandler>> {
        self.handlers.get(job_type)
    }
}

pub struct RetryPolicy {
    pub base: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { base: Duration::seconds(1), cap: Duration::minutes(5) }
    }
}

/// §4.L's queue-wide circuit breaker: N consecutive failures *of any type*
/// pauses dispatch for a cooldown. `failsafe::StateMachine` already backs
/// `crate::http`'s per-provider breaker; reused here keyed globally instead
/// of per-provider.
type QueueBreaker = StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>;

pub struct JobQueue<R: JobRepository> {
    repo: Arc<R>,
    handlers: HandlerRegistry,
    events: Arc<EventBus>,
    retry: RetryPolicy,
    breaker: QueueBreaker,
}

impl<R: JobRepository> JobQueue<R> {
    pub fn new(repo: Arc<R>, handlers: HandlerRegistry, events: Arc<EventBus>, retry: RetryPolicy, consecutive_failure_threshold: u32) -> Self {
        let breaker = Config::new()
            .failure_policy(failure_policy::consecutive_failures(
                consecutive_failure_threshold,
                backoff::exponential(std::time::Duration::from_secs(5), std::time::Duration::from_secs(600)),
            ))
            .build();
        Self { repo, handlers, events, retry, breaker }
    }

    /// §4.L crash recovery, run once at startup before the dispatch loop.
    pub async fn recover_crashed(&self) -> Result<u64> {
        let recovered = self.repo.recover_crashed().await?;
        if recovered > 0 {
            info!(recovered, "reset crashed jobs from processing back to pending");
        }
        Ok(recovered)
    }

    /// Pulls and executes the next runnable job, if any. Returns `Ok(false)`
    /// when the queue is empty or the breaker is open, so callers can sleep
    /// a beat before polling again.
    pub async fn tick(&self) -> Result<bool> {
        if !self.breaker.is_call_permitted() {
            warn!("queue circuit breaker open, skipping dispatch tick");
            return Ok(false);
        }

        let Some(mut job) = self.repo.claim_next_runnable().await? else {
            return Ok(false);
        };

        let started_at = chrono::Utc::now();
        job.start();
        self.repo.update(&job).await?;

        let status = self.dispatch(&job).await;

        match status {
            DispatchStatus::Success => {
                job.complete();
                self.breaker.on_success();
                self.events.publish(Event::JobCompleted { job_id: job.id });
            }
            DispatchStatus::Retry { error } => {
                job.fail(error.clone(), self.retry.base, self.retry.cap);
                self.breaker.on_error();
                if job.is_terminal() {
                    self.events.publish(Event::JobFailed { job_id: job.id, error });
                }
            }
            DispatchStatus::DeadLetter { error } => {
                job.error_message = Some(error.clone());
                job.status = fetcharr_model::JobStatus::Failed;
                job.updated_at = chrono::Utc::now();
                self.breaker.on_error();
                self.events.publish(Event::JobFailed { job_id: job.id, error });
            }
        }

        self.repo.update(&job).await?;

        if job.is_terminal() {
            let duration_ms = (chrono::Utc::now() - started_at).num_milliseconds();
            self.repo.move_to_history(&job, duration_ms).await?;
        }

        Ok(true)
    }

    async fn dispatch(&self, job: &Job) -> DispatchStatus {
        let Some(handler) = self.handlers.get(&job.job_type) else {
            error!(job_type = %job.job_type, "no handler registered for job type");
            return DispatchStatus::DeadLetter { error: format!("unknown job type '{}'", job.job_type) };
        };

        let ctx = JobContext { events: Arc::clone(&self.events), job_id: job.id };
        match handler.handle(job, &ctx).await {
            Ok(()) => DispatchStatus::Success,
            Err(err) if err.is_retryable() => DispatchStatus::Retry { error: err.to_string() },
            Err(err) => DispatchStatus::DeadLetter { error: err.to_string() },
        }
    }

    /// §4.L cancellation: cascades to not-yet-started children. In-flight
    /// children are left to finish their current unit of work and exit on
    /// their own cooperative check.
    pub async fn cancel(&self, job_id: JobId) -> Result<()> {
        if let Some(mut job) = self.repo.fetch(job_id).await? {
            job.cancel();
            self.repo.update(&job).await?;
        }
        for mut child in self.repo.children_of(job_id).await? {
            if matches!(child.status, fetcharr_model::JobStatus::Pending) {
                child.cancel();
                self.repo.update(&child).await?;
            }
        }
        Ok(())
    }

    pub async fn enqueue(&self, job: Job) -> Result<JobId> {
        let id = job.id;
        self.repo.insert(&job).await?;
        Ok(id)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum DispatchStatus {
    Success,
    Retry { error: String },
    DeadLetter { error: String },
}

/// Appeasement for `JobHistoryEntry`'s presence in the public surface even
/// though `queue::` itself never constructs one directly (`db::` does, from
/// a terminal `Job` row, at `move_to_history` time).
pub type HistoryRow = JobHistoryEntry;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use fetcharr_model::JobStatus;

    #[derive(Default)]
    struct FakeRepo {
        jobs: Mutex<BTreeMap<JobId, Job>>,
        history: Mutex<Vec<Job>>,
    }

    #[async_trait]
    impl JobRepository for FakeRepo {
        async fn insert(&self, job: &Job) -> Result<()> {
            self.jobs.lock().unwrap().insert(job.id, job.clone());
            Ok(())
        }
        async fn fetch(&self, id: JobId) -> Result<Option<Job>> {
            Ok(self.jobs.lock().unwrap().get(&id).cloned())
        }
        async fn claim_next_runnable(&self) -> Result<Option<Job>> {
            let jobs = self.jobs.lock().unwrap();
            Ok(jobs
                .values()
                .filter(|j| matches!(j.status, JobStatus::Pending) && j.next_retry_at.is_none_or(|t| t <= chrono::Utc::now()))
                .min_by_key(|j| (j.priority, j.created_at))
                .cloned())
        }
        async fn update(&self, job: &Job) -> Result<()> {
            self.jobs.lock().unwrap().insert(job.id, job.clone());
            Ok(())
        }
        async fn children_of(&self, parent: JobId) -> Result<Vec<Job>> {
            Ok(self.jobs.lock().unwrap().values().filter(|j| j.parent_job_id == Some(parent)).cloned().collect())
        }
        async fn recover_crashed(&self) -> Result<u64> {
            let mut jobs = self.jobs.lock().unwrap();
            let mut count = 0;
            for job in jobs.values_mut() {
                if matches!(job.status, JobStatus::Processing) {
                    job.recover_from_crash();
                    count += 1;
                }
            }
            Ok(count)
        }
        async fn move_to_history(&self, job: &Job, _duration_ms: i64) -> Result<()> {
            self.history.lock().unwrap().push(job.clone());
            self.jobs.lock().unwrap().remove(&job.id);
            Ok(())
        }
    }

    struct AlwaysSucceeds;
    #[async_trait]
    impl JobHandler for AlwaysSucceeds {
        async fn handle(&self, _job: &Job, _ctx: &JobContext) -> Result<()> {
            Ok(())
        }
    }

    struct AlwaysFailsTransient;
    #[async_trait]
    impl JobHandler for AlwaysFailsTransient {
        async fn handle(&self, _job: &Job, _ctx: &JobContext) -> Result<()> {
            Err(CoreError::Transient("boom".to_string()))
        }
    }

    fn queue(repo: Arc<FakeRepo>, handlers: HandlerRegistry) -> JobQueue<FakeRepo> {
        JobQueue::new(repo, handlers, Arc::new(EventBus::new(16, crate::events::Backpressure::DropOldest)), RetryPolicy::default(), 5)
    }

    #[tokio::test]
    async fn successful_job_moves_to_history_as_completed() {
        let repo = Arc::new(FakeRepo::default());
        let mut handlers = HandlerRegistry::new();
        handlers.register("noop", Arc::new(AlwaysSucceeds));
        let q = queue(repo.clone(), handlers);

        let job = Job::new("noop", 5, serde_json::json!({}));
        q.enqueue(job).await.unwrap();

        assert!(q.tick().await.unwrap());
        assert_eq!(repo.history.lock().unwrap().len(), 1);
        assert_eq!(repo.history.lock().unwrap()[0].status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn unknown_job_type_dead_letters_immediately() {
        let repo = Arc::new(FakeRepo::default());
        let q = queue(repo.clone(), HandlerRegistry::new());

        let job = Job::new("mystery", 5, serde_json::json!({})).with_max_retries(3);
        q.enqueue(job).await.unwrap();
        q.tick().await.unwrap();

        let history = repo.history.lock().unwrap();
        assert_eq!(history[0].status, JobStatus::Failed);
        assert_eq!(history[0].retry_count, 0);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_until_max_then_fails() {
        let repo = Arc::new(FakeRepo::default());
        let mut handlers = HandlerRegistry::new();
        handlers.register("flaky", Arc::new(AlwaysFailsTransient));
        let q = queue(repo.clone(), handlers);

        let job = Job::new("flaky", 5, serde_json::json!({})).with_max_retries(1);
        let id = job.id;
        q.enqueue(job).await.unwrap();

        q.tick().await.unwrap();
        assert_eq!(repo.fetch(id).await.unwrap().unwrap().status, JobStatus::Pending);

        // Force the retry delay to have elapsed.
        {
            let mut jobs = repo.jobs.lock().unwrap();
            jobs.get_mut(&id).unwrap().next_retry_at = None;
        }
        q.tick().await.unwrap();

        assert_eq!(repo.history.lock().unwrap()[0].status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn cancelling_a_parent_cascades_to_pending_children_only() {
        let repo = Arc::new(FakeRepo::default());
        let q = queue(repo.clone(), HandlerRegistry::new());

        let parent = Job::new("library-scan", 2, serde_json::json!({}));
        let parent_id = parent.id;
        let mut in_flight_child = Job::new("directory-scan", 2, serde_json::json!({})).child_of(parent_id);
        in_flight_child.start();
        let pending_child = Job::new("directory-scan", 2, serde_json::json!({})).child_of(parent_id);
        let pending_child_id = pending_child.id;

        repo.insert(&parent).await.unwrap();
        repo.insert(&in_flight_child).await.unwrap();
        repo.insert(&pending_child).await.unwrap();

        q.cancel(parent_id).await.unwrap();

        assert_eq!(repo.fetch(pending_child_id).await.unwrap().unwrap().status, JobStatus::Cancelled);
        assert_eq!(repo.fetch(in_flight_child.id).await.unwrap().unwrap().status, JobStatus::Processing);
    }
}
