use async_trait::async_trait;
use fetcharr_model::{MediaPlayer, PlayerGroup, PlayerGroupId, PlayerUpdate};

use super::PostgresStore;
use crate::error::Result;
use crate::notify::NotifyRepository;

const PLAYER_COLUMNS: &str = "id, group_id, name, backend, base_url, enabled, created_at";
const UPDATE_COLUMNS: &str = "id, player_id, update_type, library_path, status, scheduled_for, \
                               retry_count, max_retries, error_message, created_at, updated_at";

#[async_trait]
impl NotifyRepository for PostgresStore {
    async fn group(&self, id: PlayerGroupId) -> Result<Option<PlayerGroup>> {
        let row = sqlx::query_as::<_, PlayerGroup>(
            "SELECT id, name, max_members, created_at FROM player_groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn enabled_members(&self, group_id: PlayerGroupId) -> Result<Vec<MediaPlayer>> {
        let rows = sqlx::query_as::<_, MediaPlayer>(&format!(
            "SELECT {PLAYER_COLUMNS} FROM media_players WHERE group_id = $1 AND enabled = true"
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn enqueue_update(&self, update: &PlayerUpdate) -> Result<()> {
        sqlx::query(
            "INSERT INTO player_updates (id, player_id, update_type, library_path, status, \
             scheduled_for, retry_count, max_retries, error_message, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(update.id)
        .bind(update.player_id)
        .bind(update.update_type)
        .bind(&update.library_path)
        .bind(update.status)
        .bind(update.scheduled_for)
        .bind(update.retry_count)
        .bind(update.max_retries)
        .bind(&update.error_message)
        .bind(update.created_at)
        .bind(update.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn due_updates(&self, now: chrono::DateTime<chrono::Utc>) -> Result<Vec<PlayerUpdate>> {
        let rows = sqlx::query_as::<_, PlayerUpdate>(&format!(
            "SELECT {UPDATE_COLUMNS} FROM player_updates
             WHERE status IN ('queued', 'deferred') AND scheduled_for <= $1
             ORDER BY scheduled_for ASC"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn save_update(&self, update: &PlayerUpdate) -> Result<()> {
        sqlx::query(
            "UPDATE player_updates SET status = $2, scheduled_for = $3, retry_count = $4, \
             error_message = $5, updated_at = $6
             WHERE id = $1",
        )
        .bind(update.id)
        .bind(update.status)
        .bind(update.scheduled_for)
        .bind(update.retry_count)
        .bind(&update.error_message)
        .bind(update.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl PostgresStore {
    /// Operator-tooling lookup for the CLI's `test-player` command; not
    /// part of [`NotifyRepository`] since the notifier itself only ever
    /// addresses players through a group.
    pub async fn player_by_id(&self, id: fetcharr_model::MediaPlayerId) -> Result<Option<MediaPlayer>> {
        let row = sqlx::query_as::<_, MediaPlayer>(&format!("SELECT {PLAYER_COLUMNS} FROM media_players WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}
