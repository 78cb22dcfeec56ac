//! Shared enumerations referenced by more than one entity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of media a [`Library`](crate::library::Library) holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "media_kind", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
    Music,
}

/// The logical record type of a [`MediaItem`](crate::media_item::MediaItem).
///
/// Movies have no child levels; TV nests series -> season -> episode; music
/// nests artist -> album -> track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "entity_type", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Movie,
    Series,
    Season,
    Episode,
    Artist,
    Album,
    Track,
}

/// §3 `MediaItem.identification_status`.
///
/// Deliberately the *only* lifecycle column on `MediaItem` (§9 open
/// question). `has_unpublished_changes` is tracked separately; the broader
/// `discovered -> ... -> published` lifecycle some source notes describe is
/// observable through job history, not a column here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "identification_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum IdentificationStatus {
    #[default]
    Unidentified,
    Identified,
    Enriched,
}

/// §4.D/§4.G provider identifiers used for the fixed priority table and for
/// keying rate limiters and circuit breakers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "provider_id", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Tmdb,
    Tvdb,
    FanartTv,
    MusicBrainz,
    Local,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderId::Tmdb => "tmdb",
            ProviderId::Tvdb => "tvdb",
            ProviderId::FanartTv => "fanart.tv",
            ProviderId::MusicBrainz => "musicbrainz",
            ProviderId::Local => "local",
        };
        f.write_str(s)
    }
}

/// §4.G: the fixed per-provider base quality weight, scaled by `100` inside
/// the scoring formula's `P` term.
impl ProviderId {
    pub fn base_priority(&self) -> f64 {
        match self {
            ProviderId::FanartTv => 1.0,
            ProviderId::Tmdb => 0.8,
            ProviderId::Tvdb => 0.6,
            ProviderId::MusicBrainz => 0.6,
            ProviderId::Local => 0.5,
        }
    }
}

/// The kind of artwork/trailer/subtitle attached to a [`MediaItem`](crate::media_item::MediaItem).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "asset_type", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Poster,
    Fanart,
    Banner,
    ClearArt,
    ClearLogo,
    Landscape,
    Thumb,
    Trailer,
    Subtitle,
}

impl AssetType {
    /// Multi-slot types accept more than one active selection at once
    /// (several fanarts); single-slot types accept exactly one.
    pub fn is_multi_slot(&self) -> bool {
        matches!(self, AssetType::Fanart | AssetType::Subtitle)
    }

    /// §4.G ideal width/height ratio used by the aspect-ratio sub-score.
    pub fn ideal_aspect_ratio(&self) -> Option<f64> {
        match self {
            AssetType::Poster => Some(2.0 / 3.0),
            AssetType::Fanart | AssetType::Landscape | AssetType::Thumb => Some(16.0 / 9.0),
            AssetType::Banner => Some(5.4),
            AssetType::ClearArt | AssetType::ClearLogo => Some(1.0),
            AssetType::Trailer | AssetType::Subtitle => None,
        }
    }

    /// Whether this asset type is a still image subject to pHash dedup.
    pub fn is_image(&self) -> bool {
        !matches!(self, AssetType::Trailer | AssetType::Subtitle)
    }
}

/// §3 `AssetCandidate.selected_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "selected_by", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SelectedBy {
    Auto,
    Manual,
    Local,
}

/// §4.G library automation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "automation_mode", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum AutomationMode {
    Manual,
    #[default]
    Hybrid,
    Yolo,
}

/// §4.D per-library provider merge strategy. `FieldMapping`'s explicit
/// per-field provider bindings are configured outside the enum (they vary
/// per field, not per library), so this only names which merge algorithm
/// the orchestrator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "orchestration_strategy", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ProviderStrategy {
    #[default]
    PreferredFirstFillGaps,
    FieldMapping,
    AggregateAll,
}

/// §3/§4.L `Job.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "job_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

/// §4.L job priority bands, as a convenience over the raw `1..=10` integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityBand {
    Critical,
    High,
    Normal,
    Low,
}

impl PriorityBand {
    pub fn of(priority: u8) -> Self {
        match priority {
            1 => PriorityBand::Critical,
            2..=5 => PriorityBand::High,
            6..=7 => PriorityBand::Normal,
            _ => PriorityBand::Low,
        }
    }
}

/// §4.F parent scan job phase state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "scan_phase", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ScanPhase {
    #[default]
    Discovering,
    Scanning,
    Caching,
    Enriching,
    Complete,
    Cancelled,
}

/// §4.J per-player-update state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "update_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    #[default]
    Queued,
    Deferred,
    Executing,
    Done,
    Failed,
}

/// §4.J the kind of work queued against a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "update_type", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    Scan,
    Notification,
}

/// §6 inbound webhook source system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "manager_kind", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ManagerKind {
    Radarr,
    Sonarr,
    Lidarr,
}

/// §6 inbound webhook event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum WebhookEvent {
    Download,
    Rename,
    Delete,
    Upgrade,
}

/// §6/§4.J the kind of player endpoint a [`MediaPlayer`](crate::player::MediaPlayer) is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "player_backend_kind", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PlayerBackendKind {
    Kodi,
    Jellyfin,
    Plex,
}

/// §4.I the scope a [`PathMapping`](crate::path_mapping::PathMapping) applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum MappingScope {
    Manager(ManagerKind),
    PlayerGroup(crate::ids::PlayerGroupId),
}
