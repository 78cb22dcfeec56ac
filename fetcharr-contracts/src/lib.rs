//! Trait surfaces that cross crate boundaries: provider adapters (§4.D),
//! player backends (§4.J/§6), and the webhook payload shape (§6).
//!
//! `fetcharr-core` depends on these traits but never on a concrete
//! provider or player implementation directly, so orchestration logic can
//! be exercised against fakes in tests.

pub mod player;
pub mod provider;
pub mod webhook;

pub mod prelude {
    pub use super::player::{PlaybackState, PlayerBackend, PlayerError};
    pub use super::provider::{
        AdapterAssetCandidate, MetadataField, MetadataResponse, ProviderAdapter,
        ProviderCapabilities, ProviderError, SearchResult,
    };
    pub use super::webhook::WebhookPayload;
}
