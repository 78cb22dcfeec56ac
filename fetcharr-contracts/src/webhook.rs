//! §6 inbound webhook payload shape. The HTTP surface that decodes an
//! actual Radarr/Sonarr/Lidarr JSON body lives in `fetcharr-server`; this
//! is the normalized shape the fan-out logic in `fetcharr-core` consumes.

use fetcharr_model::{ManagerKind, WebhookEvent};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub source: ManagerKind,
    pub event: WebhookEvent,
    /// The manager's view of the file path; translated through
    /// manager-scoped path mappings before any lookup (§4.I).
    pub path: String,
    pub tmdb_id: Option<String>,
    pub tvdb_id: Option<String>,
    pub imdb_id: Option<String>,
}
