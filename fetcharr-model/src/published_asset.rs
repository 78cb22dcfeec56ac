use crate::enums::AssetType;
use crate::ids::{MediaItemId, PublishedAssetId};
use serde::{Deserialize, Serialize};

/// §3 `PublishedAsset`: a file written into a library directory, used by
/// the Disaster-Recovery Verifier to detect external modification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PublishedAsset {
    pub id: PublishedAssetId,
    pub media_item_id: MediaItemId,
    pub asset_type: AssetType,
    pub library_path: String,
    pub published_content_hash: String,
    pub stale: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl PublishedAsset {
    pub fn new(media_item_id: MediaItemId, asset_type: AssetType, library_path: impl Into<String>, published_content_hash: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: PublishedAssetId::new(),
            media_item_id,
            asset_type,
            library_path: library_path.into(),
            published_content_hash: published_content_hash.into(),
            stale: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A per-item `publish_log` row (§4.H step 6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PublishLogEntry {
    pub id: uuid::Uuid,
    pub media_item_id: MediaItemId,
    pub success: bool,
    pub duration_ms: i64,
    pub nfo_hash: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub assets_written: Vec<String>,
    pub error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
