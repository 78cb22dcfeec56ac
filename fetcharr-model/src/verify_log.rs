use crate::enums::AssetType;
use crate::ids::{MediaItemId, PublishedAssetId};
use serde::{Deserialize, Serialize};

/// §4.N one finding from a single verifier pass over one [`PublishedAsset`](crate::published_asset::PublishedAsset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "drift_outcome", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DriftOutcome {
    /// On-disk hash matched `published_content_hash`; nothing to do.
    Clean,
    /// Drifted and restored from the cache blob.
    RestoredFromCache,
    /// Drifted, cache blob also missing; a `publish` job was re-enqueued.
    Regenerated,
    /// Drifted but the asset type is user-locked; flagged, left untouched.
    FlaggedLocked,
}

/// §4.N append-only verifier finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct VerifyLogEntry {
    pub id: uuid::Uuid,
    pub media_item_id: MediaItemId,
    pub published_asset_id: PublishedAssetId,
    pub asset_type: AssetType,
    pub outcome: DriftOutcome,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl VerifyLogEntry {
    pub fn new(media_item_id: MediaItemId, published_asset_id: PublishedAssetId, asset_type: AssetType, outcome: DriftOutcome) -> Self {
        Self { id: uuid::Uuid::new_v4(), media_item_id, published_asset_id, asset_type, outcome, created_at: chrono::Utc::now() }
    }
}
