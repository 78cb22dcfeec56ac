use crate::enums::{AssetType, EntityType, IdentificationStatus};
use crate::ids::{LibraryId, MediaItemId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provider ids a [`MediaItem`] may be cross-referenced by (§3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderIds {
    pub tmdb: Option<String>,
    pub tvdb: Option<String>,
    pub imdb: Option<String>,
    pub musicbrainz: Option<String>,
}

impl ProviderIds {
    pub fn is_empty(&self) -> bool {
        self.tmdb.is_none() && self.tvdb.is_none() && self.imdb.is_none() && self.musicbrainz.is_none()
    }
}

/// Per-scalar-field lock flags (§4.M). Array-valued fields (actors, genres,
/// studios) share a single whole-array lock rather than per-element locks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldLocks {
    pub title_locked: bool,
    pub year_locked: bool,
    pub plot_locked: bool,
    pub tagline_locked: bool,
    pub runtime_locked: bool,
    pub rating_locked: bool,
    pub actors_locked: bool,
    pub genres_locked: bool,
    pub studios_locked: bool,
}

impl FieldLocks {
    /// Returns whether the named scalar/array field is locked. Unknown
    /// field names are treated as unlocked, matching the arbiter's rule
    /// that only explicitly tracked fields can be protected.
    pub fn is_locked(&self, field: &str) -> bool {
        match field {
            "title" => self.title_locked,
            "year" => self.year_locked,
            "plot" => self.plot_locked,
            "tagline" => self.tagline_locked,
            "runtime" => self.runtime_locked,
            "rating" => self.rating_locked,
            "actors" => self.actors_locked,
            "genres" => self.genres_locked,
            "studios" => self.studios_locked,
            _ => false,
        }
    }

    pub fn lock(&mut self, field: &str) {
        self.set(field, true);
    }

    pub fn unlock(&mut self, field: &str) {
        self.set(field, false);
    }

    fn set(&mut self, field: &str, value: bool) {
        match field {
            "title" => self.title_locked = value,
            "year" => self.year_locked = value,
            "plot" => self.plot_locked = value,
            "tagline" => self.tagline_locked = value,
            "runtime" => self.runtime_locked = value,
            "rating" => self.rating_locked = value,
            "actors" => self.actors_locked = value,
            "genres" => self.genres_locked = value,
            "studios" => self.studios_locked = value,
            _ => {}
        }
    }
}

/// Free-form scalar/array metadata merged in from providers or user edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub plot: Option<String>,
    pub tagline: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub rating: Option<f64>,
    pub actors: Vec<String>,
    pub genres: Vec<String>,
    pub studios: Vec<String>,
}

/// §3 `MediaItem`: the canonical logical record for a movie, series, season,
/// episode, artist, album, or track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MediaItem {
    pub id: MediaItemId,
    pub library_id: LibraryId,
    pub entity_type: EntityType,
    pub parent_id: Option<MediaItemId>,
    pub title: String,
    pub year: Option<i32>,
    pub path: String,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub provider_ids: ProviderIds,
    pub identification_status: IdentificationStatus,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub metadata: MediaMetadata,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub field_locks: FieldLocks,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub asset_locks: BTreeMap<AssetType, bool>,
    pub has_unpublished_changes: bool,
    pub deleted_on: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl MediaItem {
    pub fn new(library_id: LibraryId, entity_type: EntityType, title: impl Into<String>, path: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: MediaItemId::new(),
            library_id,
            entity_type,
            parent_id: None,
            title: title.into(),
            year: None,
            path: path.into(),
            provider_ids: ProviderIds::default(),
            identification_status: IdentificationStatus::Unidentified,
            metadata: MediaMetadata::default(),
            field_locks: FieldLocks::default(),
            asset_locks: BTreeMap::new(),
            has_unpublished_changes: false,
            deleted_on: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// §3 invariant: `identification_status = identified` implies at least
    /// one provider id is present.
    pub fn mark_identified_if_eligible(&mut self) {
        if !self.provider_ids.is_empty() && matches!(self.identification_status, IdentificationStatus::Unidentified) {
            self.identification_status = IdentificationStatus::Identified;
        }
    }

    pub fn is_asset_locked(&self, asset_type: AssetType) -> bool {
        self.asset_locks.get(&asset_type).copied().unwrap_or(false)
    }

    pub fn is_soft_deleted(&self) -> bool {
        self.deleted_on.is_some_and(|d| d <= chrono::Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identified_requires_a_provider_id() {
        let mut item = MediaItem::new(LibraryId::new(), EntityType::Movie, "Foo", "/data/movies/Foo");
        item.mark_identified_if_eligible();
        assert_eq!(item.identification_status, IdentificationStatus::Unidentified);

        item.provider_ids.tmdb = Some("603".to_string());
        item.mark_identified_if_eligible();
        assert_eq!(item.identification_status, IdentificationStatus::Identified);
    }

    #[test]
    fn field_lock_round_trips_by_name() {
        let mut locks = FieldLocks::default();
        assert!(!locks.is_locked("plot"));
        locks.lock("plot");
        assert!(locks.is_locked("plot"));
        locks.unlock("plot");
        assert!(!locks.is_locked("plot"));
    }
}
