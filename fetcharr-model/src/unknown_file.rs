use serde::{Deserialize, Serialize};

use crate::ids::{MediaItemId, UnknownFileId};

/// §4.F step 5: a file the directory-scan classifier could not place into
/// {video, image, subtitle, NFO, trailer}, bound to the media item whose
/// directory it lives in until a user resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "unknown_file_resolution", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum UnknownFileResolution {
    Delete,
    AssignToType,
    AddToIgnorePattern,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UnknownFile {
    pub id: UnknownFileId,
    pub media_item_id: MediaItemId,
    pub file_path: String,
    pub resolution: Option<UnknownFileResolution>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl UnknownFile {
    pub fn new(media_item_id: MediaItemId, file_path: impl Into<String>) -> Self {
        Self { id: UnknownFileId::new(), media_item_id, file_path: file_path.into(), resolution: None, created_at: chrono::Utc::now() }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }
}
