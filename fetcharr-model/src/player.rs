use crate::enums::PlayerBackendKind;
use crate::ids::{MediaPlayerId, PlayerGroupId};
use serde::{Deserialize, Serialize};

/// §3 `PlayerGroup`: a set of media-player endpoints that share a
/// filesystem view and path mappings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PlayerGroup {
    pub id: PlayerGroupId,
    pub name: String,
    /// `None` = unlimited, `Some(1)` = singleton.
    pub max_members: Option<i32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl PlayerGroup {
    pub fn new(name: impl Into<String>, max_members: Option<i32>) -> Self {
        Self {
            id: PlayerGroupId::new(),
            name: name.into(),
            max_members,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.max_members == Some(1)
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_members.is_none()
    }
}

/// §3 `MediaPlayer`: a single Kodi/Jellyfin/Plex endpoint, belonging to
/// exactly one [`PlayerGroup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MediaPlayer {
    pub id: MediaPlayerId,
    pub group_id: PlayerGroupId,
    pub name: String,
    pub backend: PlayerBackendKind,
    pub base_url: String,
    pub enabled: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl MediaPlayer {
    pub fn new(group_id: PlayerGroupId, name: impl Into<String>, backend: PlayerBackendKind, base_url: impl Into<String>) -> Self {
        Self {
            id: MediaPlayerId::new(),
            group_id,
            name: name.into(),
            backend,
            base_url: base_url.into(),
            enabled: true,
            created_at: chrono::Utc::now(),
        }
    }
}
