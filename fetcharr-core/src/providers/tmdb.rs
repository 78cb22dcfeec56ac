//! §4.D TMDB adapter. Grounded on the teacher's `tmdb_api_provider.rs`,
//! which wraps the same `tmdb-api` crate; this version targets the
//! `ProviderAdapter` trait surface instead of returning TMDB's own types.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tmdb_api::client::reqwest::ReqwestExecutor;
use tmdb_api::client::Client;
use tmdb_api::movie::{details::MovieDetails, images::MovieImages, search::MovieSearch};
use tmdb_api::prelude::Command;
use tmdb_api::tvshow::{details::TVShowDetails, images::TVShowImages};

use fetcharr_contracts::provider::{
    AdapterAssetCandidate, ConnectionCheck, MetadataField, MetadataResponse, ProviderAdapter,
    ProviderCapabilities, ProviderError, SearchResult,
};
use fetcharr_model::{AssetType, EntityType, ProviderId};

const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/original";

pub struct TmdbAdapter {
    client: Client<ReqwestExecutor>,
    capabilities: ProviderCapabilities,
}

impl std::fmt::Debug for TmdbAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbAdapter").finish()
    }
}

impl TmdbAdapter {
    pub fn new(api_key: String, rate_limit: &fetcharr_config::ProviderRateLimit) -> Self {
        let mut asset_types = BTreeMap::new();
        asset_types.insert(
            EntityType::Movie,
            BTreeSet::from([AssetType::Poster, AssetType::Fanart, AssetType::ClearArt]),
        );
        asset_types.insert(
            EntityType::Series,
            BTreeSet::from([AssetType::Poster, AssetType::Fanart, AssetType::Banner]),
        );

        let mut metadata_fields = BTreeMap::new();
        metadata_fields.insert(EntityType::Movie, BTreeSet::from(["title", "plot", "runtime_minutes", "rating"]));
        metadata_fields.insert(EntityType::Series, BTreeSet::from(["title", "plot", "rating"]));

        Self {
            client: Client::<ReqwestExecutor>::new(api_key),
            capabilities: ProviderCapabilities {
                id: ProviderId::Tmdb,
                supported_entity_types: BTreeSet::from([EntityType::Movie, EntityType::Series]),
                supported_asset_types: asset_types,
                supported_metadata_fields: metadata_fields,
                requires_auth: true,
                requests_per_second: rate_limit.requests_per_second,
                burst_capacity: rate_limit.burst_capacity,
                supports_search_by_external_id: false,
            },
        }
    }
}

#[async_trait]
impl ProviderAdapter for TmdbAdapter {
    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn search(
        &self,
        query: &str,
        year: Option<i32>,
        _external_ids: &BTreeMap<&'static str, String>,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let movie_search = MovieSearch::new(query.to_string());
        let search = MovieSearch::with_year(movie_search, year.map(|y| y as u16));
        let results = search.execute(&self.client).await.map_err(classify_error)?;

        Ok(results
            .results
            .into_iter()
            .map(|r| SearchResult {
                provider_result_id: r.inner.id.to_string(),
                title: r.inner.title,
                year: None,
                overview: Some(r.inner.overview),
            })
            .collect())
    }

    async fn get_metadata(
        &self,
        entity_type: EntityType,
        provider_result_id: &str,
    ) -> Result<MetadataResponse, ProviderError> {
        let id: u64 = provider_result_id.parse().map_err(|_| ProviderError::Validation("non-numeric tmdb id".into()))?;

        match entity_type {
            EntityType::Movie => {
                let details = MovieDetails::new(id).execute(&self.client).await.map_err(classify_error)?;
                let mut fields = vec![
                    MetadataField { name: "title", value: details.inner.title.clone().into() },
                    MetadataField { name: "plot", value: details.inner.overview.clone().into() },
                ];
                if let Some(runtime) = details.runtime {
                    fields.push(MetadataField { name: "runtime_minutes", value: (runtime as i64).into() });
                }
                fields.push(MetadataField { name: "rating", value: details.inner.vote_average.into() });
                Ok(MetadataResponse { completeness: fields.len() as f64 / 4.0, fields })
            }
            EntityType::Series => {
                let details = TVShowDetails::new(id).execute(&self.client).await.map_err(classify_error)?;
                let fields = vec![
                    MetadataField { name: "title", value: details.inner.name.clone().into() },
                    MetadataField { name: "plot", value: details.inner.overview.clone().unwrap_or_default().into() },
                    MetadataField { name: "rating", value: details.inner.vote_average.into() },
                ];
                Ok(MetadataResponse { completeness: fields.len() as f64 / 3.0, fields })
            }
            _ => Err(ProviderError::Validation(format!("tmdb does not support entity type {entity_type:?}"))),
        }
    }

    async fn get_assets(
        &self,
        entity_type: EntityType,
        provider_result_id: &str,
        asset_types: &BTreeSet<AssetType>,
    ) -> Result<Vec<AdapterAssetCandidate>, ProviderError> {
        let id: u64 = provider_result_id.parse().map_err(|_| ProviderError::Validation("non-numeric tmdb id".into()))?;

        let mut candidates = Vec::new();
        match entity_type {
            EntityType::Movie => {
                let images = MovieImages::new(id).execute(&self.client).await.map_err(classify_error)?;
                if asset_types.contains(&AssetType::Poster) {
                    candidates.extend(images.posters.into_iter().map(|p| to_candidate(AssetType::Poster, p)));
                }
                if asset_types.contains(&AssetType::Fanart) {
                    candidates.extend(images.backdrops.into_iter().map(|b| to_candidate(AssetType::Fanart, b)));
                }
            }
            EntityType::Series => {
                let images = TVShowImages::new(id).execute(&self.client).await.map_err(classify_error)?;
                if asset_types.contains(&AssetType::Poster) {
                    candidates.extend(images.posters.into_iter().map(|p| to_candidate(AssetType::Poster, p)));
                }
                if asset_types.contains(&AssetType::Fanart) {
                    candidates.extend(images.backdrops.into_iter().map(|b| to_candidate(AssetType::Fanart, b)));
                }
            }
            _ => {}
        }
        Ok(candidates)
    }

    async fn test_connection(&self) -> ConnectionCheck {
        match MovieDetails::new(550).execute(&self.client).await {
            Ok(_) => ConnectionCheck { ok: true, message: "tmdb reachable".into() },
            Err(err) => ConnectionCheck { ok: false, message: err.to_string() },
        }
    }
}

fn to_candidate(asset_type: AssetType, image: tmdb_api::common::image::Image) -> AdapterAssetCandidate {
    AdapterAssetCandidate {
        asset_type,
        source_url: format!("{TMDB_IMAGE_BASE}{}", image.file_path),
        width: Some(image.width as i32),
        height: Some(image.height as i32),
        language: image.iso_639_1,
        vote_count: image.vote_count as i32,
        vote_average: image.vote_average,
    }
}

/// `tmdb-api`'s own error enum doesn't expose a stable status-code shape
/// across versions, so classification falls back to matching its `Display`
/// output the way the pack's `resilience::retry::should_retry_error` does
/// for wrapped errors it can't downcast.
fn classify_error(err: tmdb_api::error::Error) -> ProviderError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    if lower.contains("timed out") || lower.contains("timeout") || lower.contains("connection") {
        ProviderError::Transient(message)
    } else if lower.contains("401") || lower.contains("invalid api key") || lower.contains("unauthorized") {
        ProviderError::Auth(message)
    } else if lower.contains("404") || lower.contains("not found") {
        ProviderError::NotFound
    } else if lower.contains("429") || lower.contains("rate limit") {
        ProviderError::RateLimited { retry_after_secs: None }
    } else {
        ProviderError::Parse(message)
    }
}
