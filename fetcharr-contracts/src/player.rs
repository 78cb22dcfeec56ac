//! §4.J/§6 player backend abstraction: "notify library changed at path" +
//! "probe playback state", uniform across Kodi/Jellyfin/Plex.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("transient network failure: {0}")]
    Transient(String),
    #[error("player rejected the request: {0}")]
    Rejected(String),
    #[error("player is unreachable")]
    Unreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    /// The player could not be probed; treated as "not idle" by the group
    /// coordinator so it is never chosen as the immediate-scan primary.
    Unknown,
}

/// Implemented once per backend kind (§6: Kodi JSON-RPC, Jellyfin REST,
/// Plex section-refresh); the group coordinator (§4.J) only ever talks to
/// this trait.
#[async_trait]
pub trait PlayerBackend: Send + Sync {
    /// Trigger a library rescan rooted at `player_facing_path` (already
    /// translated through the player group's path mappings).
    async fn notify_library_changed(&self, player_facing_path: &str) -> Result<(), PlayerError>;

    /// Probe whether the player is currently playing anything.
    async fn probe_playback_state(&self) -> Result<PlaybackState, PlayerError>;

    /// Number of updates currently queued against this player, used by the
    /// group coordinator's "smallest pending queue" tie-break when no
    /// member is idle.
    async fn pending_queue_len(&self) -> usize {
        0
    }
}
