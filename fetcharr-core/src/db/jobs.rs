use async_trait::async_trait;
use fetcharr_model::{Job, JobId};

use super::PostgresStore;
use crate::error::Result;
use crate::queue::JobRepository;

const COLUMNS: &str = "id, job_type, priority, payload, status, retry_count, max_retries, \
                        next_retry_at, parent_job_id, depends_on, progress, error_message, \
                        created_at, updated_at";

#[async_trait]
impl JobRepository for PostgresStore {
    async fn insert(&self, job: &Job) -> Result<()> {
        sqlx::query(
            "INSERT INTO jobs (id, job_type, priority, payload, status, retry_count, max_retries, \
             next_retry_at, parent_job_id, depends_on, progress, error_message, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(job.id)
        .bind(&job.job_type)
        .bind(job.priority)
        .bind(&job.payload)
        .bind(job.status)
        .bind(job.retry_count)
        .bind(job.max_retries)
        .bind(job.next_retry_at)
        .bind(job.parent_job_id)
        .bind(sqlx::types::Json(&job.depends_on))
        .bind(sqlx::types::Json(&job.progress))
        .bind(&job.error_message)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch(&self, id: JobId) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, Job>(&format!("SELECT {COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// §4.L selection: a job is runnable once it is `pending`, its retry
    /// delay (if any) has elapsed, and every id in `depends_on` belongs to a
    /// `completed` job. `FOR UPDATE SKIP LOCKED` lets several workers poll
    /// the same table without claiming the same row twice.
    async fn claim_next_runnable(&self) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, Job>(&format!(
            "SELECT {COLUMNS} FROM jobs j
             WHERE j.status = 'pending'
               AND (j.next_retry_at IS NULL OR j.next_retry_at <= now())
               AND NOT EXISTS (
                     SELECT 1 FROM jsonb_array_elements_text(j.depends_on) dep(id)
                     JOIN jobs d ON d.id = dep.id::uuid
                     WHERE d.status <> 'completed'
               )
             ORDER BY j.priority ASC, j.created_at ASC
             LIMIT 1
             FOR UPDATE SKIP LOCKED"
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, job: &Job) -> Result<()> {
        sqlx::query(
            "UPDATE jobs SET status = $2, retry_count = $3, max_retries = $4, next_retry_at = $5, \
             progress = $6, error_message = $7, updated_at = $8
             WHERE id = $1",
        )
        .bind(job.id)
        .bind(job.status)
        .bind(job.retry_count)
        .bind(job.max_retries)
        .bind(job.next_retry_at)
        .bind(sqlx::types::Json(&job.progress))
        .bind(&job.error_message)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn children_of(&self, parent: JobId) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, Job>(&format!(
            "SELECT {COLUMNS} FROM jobs WHERE parent_job_id = $1"
        ))
        .bind(parent)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// §4.L crash recovery: any row left `processing` across a restart is
    /// stale by definition (nothing else transitions a job out of
    /// `processing` except the worker that claimed it).
    async fn recover_crashed(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'pending', updated_at = now() WHERE status = 'processing'",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn move_to_history(&self, job: &Job, duration_ms: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO job_history (id, job_type, status, duration_ms, retry_count, error_message, \
             created_at, finished_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, now())",
        )
        .bind(job.id)
        .bind(&job.job_type)
        .bind(job.status)
        .bind(duration_ms)
        .bind(job.retry_count)
        .bind(&job.error_message)
        .bind(job.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM jobs WHERE id = $1").bind(job.id).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }
}

impl PostgresStore {
    /// Operator-tooling query, not part of [`JobRepository`]: the queue
    /// itself never needs "every job in status X", only the next runnable
    /// one.
    pub async fn list_by_status(&self, status: fetcharr_model::JobStatus, limit: i64) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, Job>(&format!(
            "SELECT {COLUMNS} FROM jobs WHERE status = $1 ORDER BY priority ASC, created_at ASC LIMIT $2"
        ))
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
