use async_trait::async_trait;
use fetcharr_model::{MediaItem, MediaItemId, PublishedAsset, PublishedAssetId, VerifyLogEntry};

use super::PostgresStore;
use crate::error::Result;
use crate::verify::VerifyRepository;

const MEDIA_ITEM_COLUMNS: &str = "id, library_id, entity_type, parent_id, title, year, path, \
                                   provider_ids, identification_status, metadata, field_locks, \
                                   asset_locks, has_unpublished_changes, deleted_on, created_at, updated_at";

const PUBLISHED_ASSET_COLUMNS: &str =
    "id, media_item_id, asset_type, library_path, published_content_hash, stale, created_at, updated_at";

#[async_trait]
impl VerifyRepository for PostgresStore {
    /// §4.N sweeps every item with at least one published asset rather than
    /// literally "recently published", since the verifier's job is to catch
    /// drift no matter how long ago the asset was written.
    async fn recently_published_items(&self) -> Result<Vec<MediaItem>> {
        let rows = sqlx::query_as::<_, MediaItem>(&format!(
            "SELECT DISTINCT {cols} FROM media_items m
             JOIN published_assets a ON a.media_item_id = m.id
             WHERE m.deleted_on IS NULL
             ORDER BY m.id",
            cols = MEDIA_ITEM_COLUMNS.split(", ").map(|c| format!("m.{c}")).collect::<Vec<_>>().join(", ")
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn published_assets_for(&self, media_item_id: MediaItemId) -> Result<Vec<PublishedAsset>> {
        let rows = sqlx::query_as::<_, PublishedAsset>(&format!(
            "SELECT {PUBLISHED_ASSET_COLUMNS} FROM published_assets WHERE media_item_id = $1"
        ))
        .bind(media_item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn mark_stale(&self, asset_id: PublishedAssetId, stale: bool) -> Result<()> {
        sqlx::query("UPDATE published_assets SET stale = $2, updated_at = now() WHERE id = $1")
            .bind(asset_id)
            .bind(stale)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_verify_log(&self, entry: &VerifyLogEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO verify_log (id, media_item_id, published_asset_id, asset_type, outcome, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.id)
        .bind(entry.media_item_id)
        .bind(entry.published_asset_id)
        .bind(entry.asset_type)
        .bind(entry.outcome)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
