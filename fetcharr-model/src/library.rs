use crate::enums::{AutomationMode, MediaKind, ProviderStrategy};
use crate::ids::LibraryId;
use serde::{Deserialize, Serialize};

/// §3 `Library`: a rooted directory plus media type and automation config.
///
/// Created by a user and mutated rarely; every [`MediaItem`](crate::media_item::MediaItem)
/// belongs to exactly one library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Library {
    pub id: LibraryId,
    pub name: String,
    pub root_path: String,
    pub kind: MediaKind,
    pub automation_mode: AutomationMode,
    pub strategy: ProviderStrategy,
    pub preferred_language: String,
    /// Ordered provider ids to consult, highest priority first.
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub provider_priority: Vec<crate::enums::ProviderId>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Library {
    pub fn new(name: impl Into<String>, root_path: impl Into<String>, kind: MediaKind) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: LibraryId::new(),
            name: name.into(),
            root_path: root_path.into(),
            kind,
            automation_mode: AutomationMode::default(),
            strategy: ProviderStrategy::default(),
            preferred_language: "en".to_string(),
            provider_priority: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
