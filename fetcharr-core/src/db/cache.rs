use async_trait::async_trait;
use fetcharr_model::CacheEntry;

use super::PostgresStore;
use crate::cache::CacheRepository;
use crate::error::{CoreError, Result};

const COLUMNS: &str = "content_hash, relative_path, byte_size, mime_type, width, height, \
                        perceptual_hash, reference_count, orphaned_at, created_at, last_used_at";

#[async_trait]
impl CacheRepository for PostgresStore {
    async fn find(&self, content_hash: &str) -> Result<Option<CacheEntry>> {
        let row = sqlx::query_as::<_, CacheEntry>(&format!(
            "SELECT {COLUMNS} FROM cache_entries WHERE content_hash = $1"
        ))
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert(&self, entry: &CacheEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO cache_entries (content_hash, relative_path, byte_size, mime_type, width, \
             height, perceptual_hash, reference_count, orphaned_at, created_at, last_used_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             ON CONFLICT (content_hash) DO UPDATE SET
                reference_count = EXCLUDED.reference_count,
                orphaned_at = EXCLUDED.orphaned_at,
                last_used_at = EXCLUDED.last_used_at",
        )
        .bind(&entry.content_hash)
        .bind(&entry.relative_path)
        .bind(entry.byte_size)
        .bind(&entry.mime_type)
        .bind(entry.width)
        .bind(entry.height)
        .bind(entry.perceptual_hash)
        .bind(entry.reference_count)
        .bind(entry.orphaned_at)
        .bind(entry.created_at)
        .bind(entry.last_used_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn increment_reference(&self, content_hash: &str) -> Result<()> {
        sqlx::query(
            "UPDATE cache_entries SET reference_count = reference_count + 1, orphaned_at = NULL, \
             last_used_at = now() WHERE content_hash = $1",
        )
        .bind(content_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn release_reference(&self, content_hash: &str) -> Result<CacheEntry> {
        let row = sqlx::query_as::<_, CacheEntry>(&format!(
            "UPDATE cache_entries SET
                reference_count = GREATEST(reference_count - 1, 0),
                orphaned_at = CASE WHEN reference_count - 1 <= 0 THEN now() ELSE NULL END
             WHERE content_hash = $1
             RETURNING {COLUMNS}"
        ))
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("cache entry {content_hash} not found")))?;
        Ok(row)
    }

    async fn list_orphaned_before(&self, cutoff: chrono::DateTime<chrono::Utc>) -> Result<Vec<CacheEntry>> {
        let rows = sqlx::query_as::<_, CacheEntry>(&format!(
            "SELECT {COLUMNS} FROM cache_entries WHERE orphaned_at IS NOT NULL AND orphaned_at < $1"
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete(&self, content_hash: &str) -> Result<()> {
        sqlx::query("DELETE FROM cache_entries WHERE content_hash = $1")
            .bind(content_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn restore_orphaned(&self, content_hash: &str) -> Result<()> {
        sqlx::query(
            "UPDATE cache_entries SET reference_count = GREATEST(reference_count, 1), orphaned_at = NULL, \
             last_used_at = now() WHERE content_hash = $1",
        )
        .bind(content_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
