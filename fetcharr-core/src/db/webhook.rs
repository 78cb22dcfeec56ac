use async_trait::async_trait;
use fetcharr_model::{
    Library, ManagerKind, MediaItem, MediaItemId, MediaPlayer, PathMapping, PlayerGroupId,
};

use super::PostgresStore;
use crate::error::Result;
use crate::webhook::WebhookRepository;

const MEDIA_ITEM_COLUMNS: &str = "id, library_id, entity_type, parent_id, title, year, path, \
                                   provider_ids, identification_status, metadata, field_locks, \
                                   asset_locks, has_unpublished_changes, deleted_on, created_at, updated_at";

const PLAYER_COLUMNS: &str = "id, group_id, name, backend, base_url, enabled, created_at";

#[async_trait]
impl WebhookRepository for PostgresStore {
    /// One `Library` is bound to at most one manager in `library_manager_bindings`;
    /// there is no `Library` column for this, since the binding is a
    /// webhook-ingestion concern, not a property of the library itself.
    async fn library_for_manager(&self, source: ManagerKind) -> Result<Option<Library>> {
        let row = sqlx::query_as::<_, Library>(&format!(
            "SELECT l.id, l.name, l.root_path, l.kind, l.automation_mode, l.strategy, \
             l.preferred_language, l.provider_priority, l.created_at, l.updated_at
             FROM libraries l
             JOIN library_manager_bindings b ON b.library_id = l.id
             WHERE b.manager_kind = $1"
        ))
        .bind(source)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn manager_path_mappings(&self, source: ManagerKind) -> Result<Vec<PathMapping>> {
        super::pathmap::for_manager(&self.pool, source).await
    }

    async fn find_by_path(&self, translated_path: &str) -> Result<Option<MediaItem>> {
        let row = sqlx::query_as::<_, MediaItem>(&format!(
            "SELECT {MEDIA_ITEM_COLUMNS} FROM media_items WHERE path = $1"
        ))
        .bind(translated_path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_provider_ids(
        &self,
        tmdb: Option<&str>,
        tvdb: Option<&str>,
        imdb: Option<&str>,
    ) -> Result<Option<MediaItem>> {
        let row = sqlx::query_as::<_, MediaItem>(&format!(
            "SELECT {MEDIA_ITEM_COLUMNS} FROM media_items
             WHERE ($1::text IS NOT NULL AND provider_ids->>'tmdb' = $1)
                OR ($2::text IS NOT NULL AND provider_ids->>'tvdb' = $2)
                OR ($3::text IS NOT NULL AND provider_ids->>'imdb' = $3)
             LIMIT 1"
        ))
        .bind(tmdb)
        .bind(tvdb)
        .bind(imdb)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert_media_item(&self, item: &MediaItem) -> Result<()> {
        crate::scan::ScanRepository::upsert_media_item(self, item).await?;
        Ok(())
    }

    async fn upsert_stream_probe(&self, probe: &fetcharr_model::StreamProbe) -> Result<()> {
        crate::scan::ScanRepository::upsert_stream_probe(self, probe).await
    }

    async fn soft_delete(&self, media_item_id: MediaItemId, deleted_on: chrono::DateTime<chrono::Utc>) -> Result<()> {
        sqlx::query("UPDATE media_items SET deleted_on = $2, updated_at = now() WHERE id = $1")
            .bind(media_item_id)
            .bind(deleted_on)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn enabled_player_groups(&self) -> Result<Vec<(PlayerGroupId, Vec<PathMapping>)>> {
        crate::publish::PublishRepository::enabled_player_groups(self).await
    }

    async fn players_in_groups(&self, groups: &[PlayerGroupId]) -> Result<Vec<MediaPlayer>> {
        let ids: Vec<uuid::Uuid> = groups.iter().map(|g| g.0).collect();
        let rows = sqlx::query_as::<_, MediaPlayer>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM media_players WHERE group_id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
