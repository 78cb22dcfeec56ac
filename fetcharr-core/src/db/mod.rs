//! §4.P persistent state store: the single Postgres-backed implementation of
//! every repository trait the rest of `fetcharr-core` depends on
//! (`CacheRepository`, `JobRepository`, `ScanRepository`,
//! `PublishRepository`, `NotifyRepository`, `WebhookRepository`,
//! `VerifyRepository`, `ScheduleRepository`, `SettingsRepository`), plus the
//! activity/history log.
//!
//! Grounded on `scan_teacher_ref/orchestration/persistence.rs`'s
//! `PostgresQueueService`: a health check and a schema-validation check run
//! once at connect time, a manual `Debug` impl that reports pool stats
//! instead of deriving one, and queries written against named tables rather
//! than an ORM. Every query here is runtime-checked (`sqlx::query`/
//! `query_as` against `&str`) rather than the teacher's compile-time
//! `sqlx::query!` macro, since the macro requires either a live database or
//! a checked-in `.sqlx` offline cache at build time and this crate has
//! neither.

mod activity;
mod cache;
mod jobs;
mod notify;
mod pathmap;
mod publish;
mod scan;
mod schedule;
mod settings;
mod verify;
mod webhook;

pub use activity::ActivityLog;

use std::fmt;
use std::time::Duration;

use fetcharr_config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::error::{CoreError, Result};

/// The §4.P required-index ledger: every index the schema must carry before
/// `PostgresStore` will accept traffic. Names match the migrations under
/// `fetcharr-server/migrations/`.
const REQUIRED_INDEXES: &[&str] = &[
    "idx_media_items_identification_queue",
    "idx_media_items_unpublished",
    "idx_jobs_ready_dequeue",
    "idx_cache_entries_content_hash",
    "idx_asset_candidates_lookup",
];

/// Backs every repository trait in `fetcharr-core` with one Postgres pool.
/// Cloning is cheap: `sqlx::PgPool` is an `Arc` internally, so handlers that
/// each need their own `Arc<PostgresStore>` can all share one connection
/// pool without contention beyond what Postgres itself imposes.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresStore")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

impl PostgresStore {
    /// Opens a pool per `config`, runs a health check, then verifies every
    /// index in [`REQUIRED_INDEXES`] is present. A missing index means the
    /// migrations haven't been run, and every query in this module assumes
    /// they have.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await?;

        Self::from_pool(pool).await
    }

    /// For callers (tests, `fetcharr-server` startup) that already own a
    /// pool, e.g. one built against a migrated test database.
    pub async fn from_pool(pool: PgPool) -> Result<Self> {
        sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&pool).await?;
        info!("persistent state store connected");

        for index_name in REQUIRED_INDEXES {
            let exists: Option<i32> = sqlx::query_scalar(
                "SELECT 1 FROM pg_indexes WHERE indexname = $1 AND schemaname = 'public' LIMIT 1",
            )
            .bind(index_name)
            .fetch_optional(&pool)
            .await?;

            if exists.is_none() {
                return Err(CoreError::Internal(format!(
                    "required index {index_name} is missing; run migrations"
                )));
            }
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
