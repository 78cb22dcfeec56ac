//! §4.D Fanart.tv adapter. No dedicated crate exists for this API in the
//! pack's dependency stack, so it's a thin `reqwest` JSON client — the same
//! shape the teacher uses for providers it doesn't have a typed SDK for.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::Deserialize;

use fetcharr_contracts::provider::{
    AdapterAssetCandidate, ConnectionCheck, MetadataResponse, ProviderAdapter, ProviderCapabilities,
    ProviderError, SearchResult,
};
use fetcharr_model::{AssetType, EntityType, ProviderId};

const BASE_URL: &str = "https://webservice.fanart.tv/v3";

pub struct FanartTvAdapter {
    client: reqwest::Client,
    api_key: String,
    capabilities: ProviderCapabilities,
}

impl std::fmt::Debug for FanartTvAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanartTvAdapter").finish()
    }
}

impl FanartTvAdapter {
    pub fn new(api_key: String, rate_limit: &fetcharr_config::ProviderRateLimit) -> Self {
        let mut asset_types = BTreeMap::new();
        asset_types.insert(
            EntityType::Movie,
            BTreeSet::from([AssetType::Poster, AssetType::Fanart, AssetType::ClearArt, AssetType::ClearLogo]),
        );
        asset_types.insert(
            EntityType::Series,
            BTreeSet::from([AssetType::Poster, AssetType::Fanart, AssetType::Banner, AssetType::ClearArt]),
        );

        Self {
            client: reqwest::Client::new(),
            api_key,
            capabilities: ProviderCapabilities {
                id: ProviderId::FanartTv,
                supported_entity_types: BTreeSet::from([EntityType::Movie, EntityType::Series]),
                supported_asset_types: asset_types,
                supported_metadata_fields: BTreeMap::new(),
                requires_auth: true,
                requests_per_second: rate_limit.requests_per_second,
                burst_capacity: rate_limit.burst_capacity,
                supports_search_by_external_id: true,
            },
        }
    }

    fn endpoint(&self, entity_type: EntityType, tmdb_id: &str) -> Option<String> {
        match entity_type {
            EntityType::Movie => Some(format!("{BASE_URL}/movies/{tmdb_id}?api_key={}", self.api_key)),
            EntityType::Series => Some(format!("{BASE_URL}/tv/{tmdb_id}?api_key={}", self.api_key)),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct FanartImage {
    url: String,
    lang: Option<String>,
    likes: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct FanartResponse {
    #[serde(default, rename = "movieposter")]
    movie_posters: Vec<FanartImage>,
    #[serde(default, rename = "moviebackground")]
    movie_backgrounds: Vec<FanartImage>,
    #[serde(default, rename = "tvposter")]
    tv_posters: Vec<FanartImage>,
    #[serde(default, rename = "showbackground")]
    show_backgrounds: Vec<FanartImage>,
}

fn to_candidate(asset_type: AssetType, image: FanartImage) -> AdapterAssetCandidate {
    let vote_count = image.likes.as_deref().and_then(|l| l.parse().ok()).unwrap_or(0);
    AdapterAssetCandidate {
        asset_type,
        source_url: image.url,
        width: None,
        height: None,
        language: image.lang,
        vote_count,
        vote_average: 0.0,
    }
}

#[async_trait]
impl ProviderAdapter for FanartTvAdapter {
    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    /// Fanart.tv has no text search endpoint; it is only ever queried by
    /// external id (`get_assets`), so this always returns empty.
    async fn search(
        &self,
        _query: &str,
        _year: Option<i32>,
        _external_ids: &BTreeMap<&'static str, String>,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        Ok(Vec::new())
    }

    async fn get_metadata(
        &self,
        _entity_type: EntityType,
        _provider_result_id: &str,
    ) -> Result<MetadataResponse, ProviderError> {
        Err(ProviderError::Validation("fanart.tv does not provide metadata fields".into()))
    }

    async fn get_assets(
        &self,
        entity_type: EntityType,
        provider_result_id: &str,
        asset_types: &BTreeSet<AssetType>,
    ) -> Result<Vec<AdapterAssetCandidate>, ProviderError> {
        let url = self
            .endpoint(entity_type, provider_result_id)
            .ok_or_else(|| ProviderError::Validation(format!("fanart.tv does not support entity type {entity_type:?}")))?;

        let response = self.client.get(&url).send().await.map_err(classify_transport_error)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound);
        }
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited { retry_after_secs: None });
        }
        if !response.status().is_success() {
            return Err(ProviderError::Transient(format!("fanart.tv returned {}", response.status())));
        }

        let body: FanartResponse = response.json().await.map_err(|e| ProviderError::Parse(e.to_string()))?;

        let mut candidates = Vec::new();
        if asset_types.contains(&AssetType::Poster) {
            candidates.extend(body.movie_posters.into_iter().map(|i| to_candidate(AssetType::Poster, i)));
            candidates.extend(body.tv_posters.into_iter().map(|i| to_candidate(AssetType::Poster, i)));
        }
        if asset_types.contains(&AssetType::Fanart) {
            candidates.extend(body.movie_backgrounds.into_iter().map(|i| to_candidate(AssetType::Fanart, i)));
            candidates.extend(body.show_backgrounds.into_iter().map(|i| to_candidate(AssetType::Fanart, i)));
        }
        Ok(candidates)
    }

    async fn test_connection(&self) -> ConnectionCheck {
        let url = format!("{BASE_URL}/movies/550?api_key={}", self.api_key);
        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() || response.status() == reqwest::StatusCode::NOT_FOUND => {
                ConnectionCheck { ok: true, message: "fanart.tv reachable".into() }
            }
            Ok(response) => ConnectionCheck { ok: false, message: format!("unexpected status {}", response.status()) },
            Err(err) => ConnectionCheck { ok: false, message: err.to_string() },
        }
    }
}

fn classify_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() || err.is_connect() {
        ProviderError::Transient(err.to_string())
    } else {
        ProviderError::Parse(err.to_string())
    }
}
