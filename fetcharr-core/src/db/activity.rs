//! Append-only activity/history log (§3 `Activity/History`, supplemented
//! ambient feature): every handler that does something notable records one
//! row here rather than relying on job history alone, since job history is
//! keyed by job type and loses the per-media-item narrative a user wants
//! when asking "what happened to this movie".

use fetcharr_model::{ActivityLogEntry, MediaItemId};

use super::PostgresStore;
use crate::error::Result;

pub struct ActivityLog<'a>(&'a PostgresStore);

impl PostgresStore {
    pub fn activity_log(&self) -> ActivityLog<'_> {
        ActivityLog(self)
    }
}

impl ActivityLog<'_> {
    pub async fn record(&self, entry: &ActivityLogEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO activity_log (id, media_item_id, event, message, context, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.id)
        .bind(entry.media_item_id)
        .bind(&entry.event)
        .bind(&entry.message)
        .bind(&entry.context)
        .bind(entry.created_at)
        .execute(&self.0.pool)
        .await?;
        Ok(())
    }

    /// Most recent rows for one media item, newest first; used by the CLI's
    /// history view and by any future UI.
    pub async fn recent_for_item(&self, media_item_id: MediaItemId, limit: i64) -> Result<Vec<ActivityLogEntry>> {
        let rows = sqlx::query_as::<_, ActivityLogEntry>(
            "SELECT id, media_item_id, event, message, context, created_at
             FROM activity_log
             WHERE media_item_id = $1
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(media_item_id)
        .bind(limit)
        .fetch_all(&self.0.pool)
        .await?;
        Ok(rows)
    }

    /// Most recent rows system-wide, newest first; used by the CLI's
    /// top-level activity feed.
    pub async fn recent(&self, limit: i64) -> Result<Vec<ActivityLogEntry>> {
        let rows = sqlx::query_as::<_, ActivityLogEntry>(
            "SELECT id, media_item_id, event, message, context, created_at
             FROM activity_log
             ORDER BY created_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.0.pool)
        .await?;
        Ok(rows)
    }
}
