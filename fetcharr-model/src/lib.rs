//! Shared data model for the fetcharr media-metadata pipeline.
//!
//! Every entity in the design — libraries, media items, asset candidates,
//! cache entries, jobs, players, path mappings — lives here as plain data.
//! Behaviour (scan orchestration, scoring, publishing) lives in
//! `fetcharr-core`; this crate only carries the types and the small,
//! side-effect-free invariants that follow directly from a type's shape
//! (state transitions, consistency checks).

pub mod activity_log;
pub mod asset_candidate;
pub mod cache_entry;
pub mod enums;
pub mod error;
pub mod ids;
pub mod job;
pub mod library;
pub mod media_item;
pub mod path_mapping;
pub mod player;
pub mod player_update;
pub mod published_asset;
pub mod rejected_asset;
pub mod stream_probe;
pub mod unknown_file;
pub mod verify_log;

pub use activity_log::ActivityLogEntry;
pub use asset_candidate::AssetCandidate;
pub use cache_entry::CacheEntry;
pub use enums::{
    AssetType, AutomationMode, EntityType, IdentificationStatus, JobStatus, ManagerKind,
    MappingScope, MediaKind, PlayerBackendKind, PriorityBand, ProviderId, ProviderStrategy,
    ScanPhase, SelectedBy, UpdateStatus, UpdateType, WebhookEvent,
};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{
    ActivityLogId, AssetCandidateId, JobId, LibraryId, MediaItemId, MediaPlayerId, PathMappingId,
    PlayerGroupId, PlayerUpdateId, PublishedAssetId, UnknownFileId,
};
pub use job::{Job, JobHistoryEntry, JobProgress};
pub use library::Library;
pub use media_item::{FieldLocks, MediaItem, MediaMetadata, ProviderIds};
pub use path_mapping::PathMapping;
pub use player::{MediaPlayer, PlayerGroup};
pub use player_update::PlayerUpdate;
pub use published_asset::{PublishLogEntry, PublishedAsset};
pub use rejected_asset::RejectedAsset;
pub use stream_probe::{AudioStreamFacts, StreamProbe, SubtitleStreamFacts, VideoStreamFacts};
pub use unknown_file::{UnknownFile, UnknownFileResolution};
pub use verify_log::{DriftOutcome, VerifyLogEntry};
