//! §4.D Provider Registry & Adapters: the orchestrator's view of a
//! heterogeneous external metadata/artwork provider.

use async_trait::async_trait;
use fetcharr_model::{AssetType, EntityType, ProviderId};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("transient network failure: {0}")]
    Transient(String),
    #[error("rate limited, retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },
    #[error("authentication or configuration error: {0}")]
    Auth(String),
    #[error("no result found")]
    NotFound,
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("response could not be parsed: {0}")]
    Parse(String),
}

/// Static, compile-time-ish description of what an adapter can do. Held by
/// the registry and consulted by the orchestrator before dispatching a
/// query, so an adapter is never asked for an asset type or field it never
/// declared support for.
#[derive(Debug, Clone)]
pub struct ProviderCapabilities {
    pub id: ProviderId,
    pub supported_entity_types: BTreeSet<EntityType>,
    pub supported_asset_types: BTreeMap<EntityType, BTreeSet<AssetType>>,
    pub supported_metadata_fields: BTreeMap<EntityType, BTreeSet<&'static str>>,
    pub requires_auth: bool,
    pub requests_per_second: f64,
    pub burst_capacity: u32,
    pub supports_search_by_external_id: bool,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub provider_result_id: String,
    pub title: String,
    pub year: Option<i32>,
    pub overview: Option<String>,
}

/// One resolved metadata field value plus the completeness/quality signal
/// the orchestrator's aggregate-all strategy compares across providers.
#[derive(Debug, Clone)]
pub struct MetadataField {
    pub name: &'static str,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub struct MetadataResponse {
    pub fields: Vec<MetadataField>,
    /// In `[0, 1]`; fraction of the entity type's known fields this
    /// response populated. Used to pick a winner in aggregate-all mode.
    pub completeness: f64,
}

/// An asset candidate as returned by a provider, before it has been
/// downloaded, hashed, or scored — the model-layer `AssetCandidate` adds
/// those fields once the orchestrator has processed this value.
#[derive(Debug, Clone)]
pub struct AdapterAssetCandidate {
    pub asset_type: AssetType,
    pub source_url: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub language: Option<String>,
    pub vote_count: i32,
    pub vote_average: f64,
}

#[derive(Debug, Clone)]
pub struct ConnectionCheck {
    pub ok: bool,
    pub message: String,
}

/// §4.D adapter surface. Every external metadata/artwork source — TMDB,
/// TVDB, Fanart.tv, MusicBrainz — implements this uniformly; the
/// orchestrator never branches on provider identity beyond reading
/// [`ProviderCapabilities::id`].
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn capabilities(&self) -> &ProviderCapabilities;

    async fn search(
        &self,
        query: &str,
        year: Option<i32>,
        external_ids: &BTreeMap<&'static str, String>,
    ) -> Result<Vec<SearchResult>, ProviderError>;

    async fn get_metadata(
        &self,
        entity_type: EntityType,
        provider_result_id: &str,
    ) -> Result<MetadataResponse, ProviderError>;

    async fn get_assets(
        &self,
        entity_type: EntityType,
        provider_result_id: &str,
        asset_types: &BTreeSet<AssetType>,
    ) -> Result<Vec<AdapterAssetCandidate>, ProviderError>;

    async fn test_connection(&self) -> ConnectionCheck;
}
