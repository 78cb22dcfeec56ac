use crate::ids::{ActivityLogId, MediaItemId};
use serde::{Deserialize, Serialize};

/// §3 `Activity/History`: an append-only audit log row for a significant
/// event (enrichment applied, lock skip, publish result, GC run, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ActivityLogEntry {
    pub id: ActivityLogId,
    pub media_item_id: Option<MediaItemId>,
    pub event: String,
    pub message: String,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub context: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ActivityLogEntry {
    pub fn new(event: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: ActivityLogId::new(),
            media_item_id: None,
            event: event.into(),
            message: message.into(),
            context: serde_json::Value::Null,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn for_media_item(mut self, id: MediaItemId) -> Self {
        self.media_item_id = Some(id);
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}
