use std::collections::BTreeSet;

use async_trait::async_trait;
use fetcharr_model::{
    AssetCandidate, AssetCandidateId, AssetType, Library, LibraryId, MediaItem, MediaItemId,
    ProviderId, StreamProbe, UnknownFile,
};

use super::PostgresStore;
use crate::error::Result;
use crate::scan::ScanRepository;

const LIBRARY_COLUMNS: &str = "id, name, root_path, kind, automation_mode, strategy, \
                                preferred_language, provider_priority, created_at, updated_at";

const MEDIA_ITEM_COLUMNS: &str = "id, library_id, entity_type, parent_id, title, year, path, \
                                   provider_ids, identification_status, metadata, field_locks, \
                                   asset_locks, has_unpublished_changes, deleted_on, created_at, updated_at";

const CANDIDATE_COLUMNS: &str = "id, media_item_id, asset_type, provider, source_url, width, height, \
                                  language, vote_count, vote_average, score, is_downloaded, is_selected, \
                                  is_rejected, selected_by, content_hash, perceptual_hash, created_at, updated_at";

#[async_trait]
impl ScanRepository for PostgresStore {
    async fn library(&self, id: LibraryId) -> Result<Option<Library>> {
        let row = sqlx::query_as::<_, Library>(&format!("SELECT {LIBRARY_COLUMNS} FROM libraries WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn media_item(&self, id: MediaItemId) -> Result<Option<MediaItem>> {
        let row = sqlx::query_as::<_, MediaItem>(&format!(
            "SELECT {MEDIA_ITEM_COLUMNS} FROM media_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_media_item_by_path(&self, library_id: LibraryId, path: &str) -> Result<Option<MediaItem>> {
        let row = sqlx::query_as::<_, MediaItem>(&format!(
            "SELECT {MEDIA_ITEM_COLUMNS} FROM media_items WHERE library_id = $1 AND path = $2"
        ))
        .bind(library_id)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert_media_item(&self, item: &MediaItem) -> Result<MediaItemId> {
        let id: MediaItemId = sqlx::query_scalar(
            "INSERT INTO media_items (id, library_id, entity_type, parent_id, title, year, path, \
             provider_ids, identification_status, metadata, field_locks, asset_locks, \
             has_unpublished_changes, deleted_on, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                year = EXCLUDED.year,
                provider_ids = EXCLUDED.provider_ids,
                identification_status = EXCLUDED.identification_status,
                metadata = EXCLUDED.metadata,
                field_locks = EXCLUDED.field_locks,
                asset_locks = EXCLUDED.asset_locks,
                has_unpublished_changes = EXCLUDED.has_unpublished_changes,
                deleted_on = EXCLUDED.deleted_on,
                updated_at = EXCLUDED.updated_at
             RETURNING id",
        )
        .bind(item.id)
        .bind(item.library_id)
        .bind(item.entity_type)
        .bind(item.parent_id)
        .bind(&item.title)
        .bind(item.year)
        .bind(&item.path)
        .bind(sqlx::types::Json(&item.provider_ids))
        .bind(item.identification_status)
        .bind(sqlx::types::Json(&item.metadata))
        .bind(sqlx::types::Json(&item.field_locks))
        .bind(sqlx::types::Json(&item.asset_locks))
        .bind(item.has_unpublished_changes)
        .bind(item.deleted_on)
        .bind(item.created_at)
        .bind(item.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_unknown_file(&self, file: &UnknownFile) -> Result<()> {
        sqlx::query(
            "INSERT INTO unknown_files (id, media_item_id, file_path, resolution, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(file.id)
        .bind(file.media_item_id)
        .bind(&file.file_path)
        .bind(file.resolution)
        .bind(file.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// §4.E: full replacement, never a merge, so the prior row for this
    /// `(media_item_id, file_path)` pair is deleted first.
    async fn upsert_stream_probe(&self, probe: &StreamProbe) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM stream_probes WHERE media_item_id = $1 AND file_path = $2")
            .bind(probe.media_item_id)
            .bind(&probe.file_path)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO stream_probes (media_item_id, file_path, video_streams, audio_streams, \
             subtitle_streams, probed_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(probe.media_item_id)
        .bind(&probe.file_path)
        .bind(sqlx::types::Json(&probe.video_streams))
        .bind(sqlx::types::Json(&probe.audio_streams))
        .bind(sqlx::types::Json(&probe.subtitle_streams))
        .bind(probe.probed_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_candidates(&self, candidates: &[AssetCandidate]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for candidate in candidates {
            sqlx::query(
                "INSERT INTO asset_candidates (id, media_item_id, asset_type, provider, source_url, \
                 width, height, language, vote_count, vote_average, score, is_downloaded, is_selected, \
                 is_rejected, selected_by, content_hash, perceptual_hash, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(candidate.id)
            .bind(candidate.media_item_id)
            .bind(candidate.asset_type)
            .bind(candidate.provider)
            .bind(&candidate.source_url)
            .bind(candidate.width)
            .bind(candidate.height)
            .bind(&candidate.language)
            .bind(candidate.vote_count)
            .bind(candidate.vote_average)
            .bind(candidate.score)
            .bind(candidate.is_downloaded)
            .bind(candidate.is_selected)
            .bind(candidate.is_rejected)
            .bind(candidate.selected_by)
            .bind(&candidate.content_hash)
            .bind(candidate.perceptual_hash)
            .bind(candidate.created_at)
            .bind(candidate.updated_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn candidates_for(&self, media_item_id: MediaItemId, asset_type: AssetType) -> Result<Vec<AssetCandidate>> {
        let rows = sqlx::query_as::<_, AssetCandidate>(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM asset_candidates WHERE media_item_id = $1 AND asset_type = $2"
        ))
        .bind(media_item_id)
        .bind(asset_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_candidate(&self, candidate: &AssetCandidate) -> Result<()> {
        sqlx::query(
            "UPDATE asset_candidates SET is_downloaded = $2, is_selected = $3, is_rejected = $4, \
             selected_by = $5, content_hash = $6, perceptual_hash = $7, updated_at = $8
             WHERE id = $1",
        )
        .bind(candidate.id)
        .bind(candidate.is_downloaded)
        .bind(candidate.is_selected)
        .bind(candidate.is_rejected)
        .bind(candidate.selected_by)
        .bind(&candidate.content_hash)
        .bind(candidate.perceptual_hash)
        .bind(candidate.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn candidate(&self, id: AssetCandidateId) -> Result<Option<AssetCandidate>> {
        let row = sqlx::query_as::<_, AssetCandidate>(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM asset_candidates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn items_awaiting_enrichment(&self, library_id: LibraryId) -> Result<Vec<MediaItem>> {
        let rows = sqlx::query_as::<_, MediaItem>(&format!(
            "SELECT {MEDIA_ITEM_COLUMNS} FROM media_items
             WHERE library_id = $1 AND identification_status = 'identified' AND deleted_on IS NULL"
        ))
        .bind(library_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn globally_rejected_assets(&self) -> Result<BTreeSet<(ProviderId, String)>> {
        let rows: Vec<(ProviderId, String)> =
            sqlx::query_as("SELECT provider, provider_url FROM rejected_assets").fetch_all(&self.pool).await?;
        Ok(rows.into_iter().collect())
    }
}
