use async_trait::async_trait;
use fetcharr_model::{
    AssetCandidate, Library, MediaItem, MediaItemId, PathMapping, PlayerGroupId, PublishLogEntry,
    PublishedAsset, PublishedAssetId,
};

use super::PostgresStore;
use crate::error::Result;
use crate::publish::PublishRepository;

const PUBLISHED_ASSET_COLUMNS: &str =
    "id, media_item_id, asset_type, library_path, published_content_hash, stale, created_at, updated_at";

#[async_trait]
impl PublishRepository for PostgresStore {
    async fn media_item(&self, id: MediaItemId) -> Result<Option<MediaItem>> {
        crate::scan::ScanRepository::media_item(self, id).await
    }

    async fn library(&self, id: fetcharr_model::LibraryId) -> Result<Option<Library>> {
        crate::scan::ScanRepository::library(self, id).await
    }

    async fn selected_candidates(&self, media_item_id: MediaItemId) -> Result<Vec<AssetCandidate>> {
        let rows = sqlx::query_as::<_, AssetCandidate>(
            "SELECT id, media_item_id, asset_type, provider, source_url, width, height, language, \
             vote_count, vote_average, score, is_downloaded, is_selected, is_rejected, selected_by, \
             content_hash, perceptual_hash, created_at, updated_at
             FROM asset_candidates WHERE media_item_id = $1 AND is_selected = true",
        )
        .bind(media_item_id)
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

    async fn upsert_published_asset(&self, asset: &PublishedAsset) -> Result<()> {
        sqlx::query(
            "INSERT INTO published_assets (id, media_item_id, asset_type, library_path, \
             published_content_hash, stale, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (id) DO UPDATE SET
                library_path = EXCLUDED.library_path,
                published_content_hash = EXCLUDED.published_content_hash,
                stale = EXCLUDED.stale,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(asset.id)
        .bind(asset.media_item_id)
        .bind(asset.asset_type)
        .bind(&asset.library_path)
        .bind(&asset.published_content_hash)
        .bind(asset.stale)
        .bind(asset.created_at)
        .bind(asset.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_published_asset(&self, id: PublishedAssetId) -> Result<()> {
        sqlx::query("DELETE FROM published_assets WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_publish_log(&self, entry: &PublishLogEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO publish_log (id, media_item_id, success, duration_ms, nfo_hash, \
             assets_written, error, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(entry.id)
        .bind(entry.media_item_id)
        .bind(entry.success)
        .bind(entry.duration_ms)
        .bind(&entry.nfo_hash)
        .bind(sqlx::types::Json(&entry.assets_written))
        .bind(&entry.error)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_unpublished_flag(&self, media_item_id: MediaItemId) -> Result<()> {
        sqlx::query("UPDATE media_items SET has_unpublished_changes = false, updated_at = now() WHERE id = $1")
            .bind(media_item_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn enabled_player_groups(&self) -> Result<Vec<(PlayerGroupId, Vec<PathMapping>)>> {
        let group_ids: Vec<PlayerGroupId> = sqlx::query_scalar(
            "SELECT DISTINCT g.id FROM player_groups g
             JOIN media_players p ON p.group_id = g.id
             WHERE p.enabled = true",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut groups = Vec::with_capacity(group_ids.len());
        for group_id in group_ids {
            let mappings = super::pathmap::for_group(&self.pool, group_id).await?;
            groups.push((group_id, mappings));
        }
        Ok(groups)
    }
}
