use crate::enums::{AssetType, ProviderId, SelectedBy};
use crate::ids::{AssetCandidateId, MediaItemId};
use serde::{Deserialize, Serialize};

/// §3 `AssetCandidate`: a (MediaItem, asset-type, provider, source-URL)
/// tuple describing an artwork/trailer/subtitle option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AssetCandidate {
    pub id: AssetCandidateId,
    pub media_item_id: MediaItemId,
    pub asset_type: AssetType,
    pub provider: ProviderId,
    pub source_url: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub language: Option<String>,
    pub vote_count: i32,
    pub vote_average: f64,
    pub score: Option<f64>,
    pub is_downloaded: bool,
    pub is_selected: bool,
    pub is_rejected: bool,
    pub selected_by: Option<SelectedBy>,
    pub content_hash: Option<String>,
    pub perceptual_hash: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl AssetCandidate {
    pub fn new(
        media_item_id: MediaItemId,
        asset_type: AssetType,
        provider: ProviderId,
        source_url: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: AssetCandidateId::new(),
            media_item_id,
            asset_type,
            provider,
            source_url: source_url.into(),
            width: None,
            height: None,
            language: None,
            vote_count: 0,
            vote_average: 0.0,
            score: None,
            is_downloaded: false,
            is_selected: false,
            is_rejected: false,
            selected_by: None,
            content_hash: None,
            perceptual_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// §3 invariant: `is_downloaded = true` implies `content_hash` is set.
    pub fn mark_downloaded(&mut self, content_hash: impl Into<String>, perceptual_hash: Option<i64>) {
        self.content_hash = Some(content_hash.into());
        self.perceptual_hash = perceptual_hash;
        self.is_downloaded = true;
    }

    /// §3 invariant: `is_selected = true` implies `is_rejected = false`.
    pub fn select(&mut self, by: SelectedBy) {
        self.is_rejected = false;
        self.is_selected = true;
        self.selected_by = Some(by);
    }

    pub fn reject(&mut self) {
        self.is_selected = false;
        self.selected_by = None;
        self.is_rejected = true;
    }

    /// §8 invariant 4: selected candidates must be downloaded by publish time.
    pub fn is_publish_ready(&self) -> bool {
        !self.is_selected || self.is_downloaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selecting_clears_rejection() {
        let mut c = AssetCandidate::new(MediaItemId::new(), AssetType::Poster, ProviderId::Tmdb, "https://x/p.jpg");
        c.reject();
        assert!(c.is_rejected);
        c.select(SelectedBy::Auto);
        assert!(c.is_selected);
        assert!(!c.is_rejected);
    }

    #[test]
    fn selected_but_not_downloaded_is_not_publish_ready() {
        let mut c = AssetCandidate::new(MediaItemId::new(), AssetType::Poster, ProviderId::Tmdb, "https://x/p.jpg");
        c.select(SelectedBy::Auto);
        assert!(!c.is_publish_ready());
        c.mark_downloaded("abc123", None);
        assert!(c.is_publish_ready());
    }
}
