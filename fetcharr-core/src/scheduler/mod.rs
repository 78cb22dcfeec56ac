//! §4.O scheduler: a lightweight cron-like driver. Every tick emits a job to
//! the queue rather than calling a handler directly, so scheduling stays
//! observable and serialized through the same priority/retry/circuit-breaker
//! machinery as everything else (§4.L). Grounded on
//! `notify::UpdateQueueProcessor::run_periodic`'s `tokio::time::interval`
//! loop shape, generalized from one schedule to several running
//! concurrently under one `tokio::select!`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use fetcharr_config::ScheduleConfig;
use fetcharr_model::{Job, LibraryId};

use crate::error::Result;
use crate::queue::{JobContext, JobHandler, JobRepository};

mod priority {
    pub const AUTO_SCAN: i16 = 6;
    pub const VERIFICATION: i16 = 9;
    pub const ACTOR_CLEANUP: i16 = 9;
    pub const CACHE_GC: i16 = 10;
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Libraries configured for a periodic full rescan, independent of
    /// webhook-triggered scans.
    async fn library_ids_for_periodic_scan(&self) -> Result<Vec<LibraryId>>;
}

pub struct Scheduler<S: ScheduleRepository> {
    repo: Arc<S>,
    jobs: Arc<dyn JobRepository>,
    config: ScheduleConfig,
}

impl<S: ScheduleRepository> std::fmt::Debug for Scheduler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler").finish_non_exhaustive()
    }
}

impl<S: ScheduleRepository> Scheduler<S> {
    pub fn new(repo: Arc<S>, jobs: Arc<dyn JobRepository>, config: ScheduleConfig) -> Self {
        Self { repo, jobs, config }
    }

    async fn enqueue(&self, job_type: &str, priority: i16, payload: serde_json::Value) {
        let job = Job::new(job_type, priority, payload);
        if let Err(err) = self.jobs.insert(&job).await {
            warn!(job_type, error = %err, "scheduler failed to enqueue job");
        } else {
            info!(job_type, job_id = %job.id, "scheduler enqueued job");
        }
    }

    async fn run_verification_tick(&self) {
        self.enqueue("verify", priority::VERIFICATION, serde_json::json!({})).await;
    }

    async fn run_actor_cleanup_tick(&self) {
        self.enqueue("actor-cleanup", priority::ACTOR_CLEANUP, serde_json::json!({})).await;
    }

    async fn run_cache_gc_tick(&self) {
        self.enqueue("cache-gc", priority::CACHE_GC, serde_json::json!({})).await;
    }

    async fn run_library_scan_tick(&self) {
        let library_ids = match self.repo.library_ids_for_periodic_scan().await {
            Ok(ids) => ids,
            Err(err) => {
                warn!(error = %err, "scheduler failed to list libraries for periodic scan");
                return;
            }
        };
        for library_id in library_ids {
            self.enqueue("library-scan", priority::AUTO_SCAN, serde_json::json!({ "library_id": library_id })).await;
        }
    }

    /// Drives every standard schedule concurrently until cancelled. Each
    /// schedule is its own `tokio::time::interval`, so a slow tick on one
    /// never delays another.
    pub async fn run(self: Arc<Self>) {
        let mut verification = tokio::time::interval(std::time::Duration::from_secs(self.config.verification_interval_secs));
        let mut actor_cleanup = tokio::time::interval(std::time::Duration::from_secs(self.config.actor_cleanup_interval_secs));
        let mut cache_gc = tokio::time::interval(std::time::Duration::from_secs(self.config.cache_gc_interval_secs));
        let mut library_scan = tokio::time::interval(std::time::Duration::from_secs(self.config.library_scan_interval_secs));

        verification.tick().await;
        actor_cleanup.tick().await;
        cache_gc.tick().await;
        library_scan.tick().await;

        loop {
            tokio::select! {
                _ = verification.tick() => self.run_verification_tick().await,
                _ = actor_cleanup.tick() => self.run_actor_cleanup_tick().await,
                _ = cache_gc.tick() => self.run_cache_gc_tick().await,
                _ = library_scan.tick() => self.run_library_scan_tick().await,
            }
        }
    }
}

/// §4.O daily `actor-cleanup` job. Cast/crew names live as a plain
/// `Vec<String>` on [`fetcharr_model::MediaMetadata`](fetcharr_model::media_item::MediaMetadata)
/// rather than a normalized, reference-counted table (§3 has no separate
/// Actor entity), so there is no orphan row state to sweep; this handler
/// exists so the schedule has a real job type to dispatch to rather than
/// the scheduler silently dropping the tick.
#[derive(Debug, Default)]
pub struct ActorCleanupHandler;

#[async_trait]
impl JobHandler for ActorCleanupHandler {
    async fn handle(&self, _job: &Job, ctx: &JobContext) -> Result<()> {
        ctx.report_progress(1, Some(1), Some("no normalized actor table to clean".to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeJobs {
        inserted: Mutex<Vec<Job>>,
    }

    #[async_trait]
    impl JobRepository for FakeJobs {
        async fn insert(&self, job: &Job) -> Result<()> {
            self.inserted.lock().unwrap().push(job.clone());
            Ok(())
        }
        async fn fetch(&self, _id: fetcharr_model::JobId) -> Result<Option<Job>> {
            Ok(None)
        }
        async fn claim_next_runnable(&self) -> Result<Option<Job>> {
            Ok(None)
        }
        async fn update(&self, _job: &Job) -> Result<()> {
            Ok(())
        }
        async fn children_of(&self, _parent: fetcharr_model::JobId) -> Result<Vec<Job>> {
            Ok(Vec::new())
        }
        async fn recover_crashed(&self) -> Result<u64> {
            Ok(0)
        }
        async fn move_to_history(&self, _job: &Job, _duration_ms: i64) -> Result<()> {
            Ok(())
        }
    }

    struct FakeSchedule {
        ids: Vec<LibraryId>,
    }

    #[async_trait]
    impl ScheduleRepository for FakeSchedule {
        async fn library_ids_for_periodic_scan(&self) -> Result<Vec<LibraryId>> {
            Ok(self.ids.clone())
        }
    }

    #[tokio::test]
    async fn library_scan_tick_enqueues_one_job_per_library() {
        let jobs = Arc::new(FakeJobs::default());
        let ids = vec![LibraryId::new(), LibraryId::new()];
        let repo = Arc::new(FakeSchedule { ids: ids.clone() });
        let scheduler = Scheduler::new(repo, jobs.clone(), ScheduleConfig::default());

        scheduler.run_library_scan_tick().await;

        let inserted = jobs.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 2);
        assert!(inserted.iter().all(|j| j.job_type == "library-scan"));
    }

    #[tokio::test]
    async fn verification_tick_enqueues_low_priority_verify_job() {
        let jobs = Arc::new(FakeJobs::default());
        let repo = Arc::new(FakeSchedule { ids: Vec::new() });
        let scheduler = Scheduler::new(repo, jobs.clone(), ScheduleConfig::default());

        scheduler.run_verification_tick().await;

        let inserted = jobs.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].job_type, "verify");
        assert_eq!(inserted[0].priority, priority::VERIFICATION);
    }
}
