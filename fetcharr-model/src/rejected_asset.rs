use crate::enums::ProviderId;
use serde::{Deserialize, Serialize};

/// §3 `RejectedAsset`: a global blacklist entry, keyed by `(provider,
/// provider_url)`. Once inserted, the asset is excluded from selection
/// across every media item, forever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RejectedAsset {
    pub provider: ProviderId,
    pub provider_url: String,
    pub reason: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl RejectedAsset {
    pub fn new(provider: ProviderId, provider_url: impl Into<String>, reason: Option<String>) -> Self {
        Self {
            provider,
            provider_url: provider_url.into(),
            reason,
            created_at: chrono::Utc::now(),
        }
    }
}
