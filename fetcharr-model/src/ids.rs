//! Strongly typed identifiers for every entity in the data model.
//!
//! Every id wraps a UUIDv7 so that natural creation order is preserved in
//! the bit pattern, which keeps B-tree indices on the id columns well
//! behaved under the "ascending `created_at`" tie-break the job queue and
//! scan pipeline both rely on.

use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
        #[cfg_attr(feature = "sqlx", sqlx(transparent))]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn into_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

define_id!(
    /// A rooted library directory (§3 `Library`).
    LibraryId
);
define_id!(
    /// A movie / series / season / episode / artist / album / track (§3 `MediaItem`).
    MediaItemId
);
define_id!(
    /// A not-yet-or-already-downloaded artwork/trailer/subtitle option (§3 `AssetCandidate`).
    AssetCandidateId
);
define_id!(
    /// A unit of asynchronous work tracked by the priority job queue (§3 `Job`).
    JobId
);
define_id!(
    /// A Kodi/Jellyfin/Plex endpoint (§3 `MediaPlayer`).
    MediaPlayerId
);
define_id!(
    /// A set of players sharing a filesystem view (§3 `PlayerGroup`).
    PlayerGroupId
);
define_id!(
    /// An ordered prefix-rewrite rule set (§3 `PathMapping`).
    PathMappingId
);
define_id!(
    /// An append-only audit log row (§3 `Activity/History`).
    ActivityLogId
);
define_id!(
    /// A written-to-library file tracked for drift detection (§3 `PublishedAsset`).
    PublishedAssetId
);
define_id!(
    /// A directory-scan file the classifier could not place into a known
    /// category (§4.F step 5 `UnknownFile`).
    UnknownFileId
);
define_id!(
    /// A queued scan/notification update against one [`MediaPlayer`](crate::player::MediaPlayer) (§4.J).
    PlayerUpdateId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_display_and_parse() {
        let id = MediaItemId::new();
        let text = id.to_string();
        let parsed: MediaItemId = text.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn distinct_ids_sort_by_creation_order() {
        let a = JobId::new();
        let b = JobId::new();
        assert!(a < b, "uuidv7 ids must sort by creation time");
    }
}
