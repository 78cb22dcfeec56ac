//! §4.D: a static map from [`ProviderId`] to adapter, in priority order.
//! The orchestrator never branches on provider identity; it only reads
//! capabilities and priority off this registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use fetcharr_contracts::provider::ProviderAdapter;
use fetcharr_model::ProviderId;

#[derive(Default)]
pub struct ProviderRegistry {
    adapters: BTreeMap<ProviderId, Arc<dyn ProviderAdapter>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry").field("providers", &self.adapters.keys().collect::<Vec<_>>()).finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        let id = adapter.capabilities().id;
        self.adapters.insert(id, adapter);
    }

    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&id).cloned()
    }

    /// Enabled adapters ordered by the library's `provider_priority` list;
    /// any registered-but-unlisted adapter is appended after, in its own
    /// default `ProviderId` order (stable, deterministic).
    pub fn ordered_by_priority(&self, priority: &[ProviderId]) -> Vec<Arc<dyn ProviderAdapter>> {
        let mut seen = std::collections::BTreeSet::new();
        let mut ordered = Vec::new();

        for id in priority {
            if let Some(adapter) = self.adapters.get(id) {
                ordered.push(adapter.clone());
                seen.insert(*id);
            }
        }
        for (id, adapter) in &self.adapters {
            if !seen.contains(id) {
                ordered.push(adapter.clone());
            }
        }
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fetcharr_contracts::provider::{
        AdapterAssetCandidate, ConnectionCheck, MetadataResponse, ProviderCapabilities, ProviderError,
        SearchResult,
    };
    use fetcharr_model::{AssetType, EntityType};

    struct StubAdapter(ProviderId);

    #[async_trait]
    impl ProviderAdapter for StubAdapter {
        fn capabilities(&self) -> &ProviderCapabilities {
            Box::leak(Box::new(ProviderCapabilities {
                id: self.0,
                supported_entity_types: Default::default(),
                supported_asset_types: Default::default(),
                supported_metadata_fields: Default::default(),
                requires_auth: false,
                requests_per_second: 1.0,
                burst_capacity: 1,
                supports_search_by_external_id: false,
            }))
        }
        async fn search(
            &self,
            _q: &str,
            _y: Option<i32>,
            _e: &std::collections::BTreeMap<&'static str, String>,
        ) -> Result<Vec<SearchResult>, ProviderError> {
            Ok(vec![])
        }
        async fn get_metadata(&self, _e: EntityType, _id: &str) -> Result<MetadataResponse, ProviderError> {
            Err(ProviderError::NotFound)
        }
        async fn get_assets(
            &self,
            _e: EntityType,
            _id: &str,
            _t: &std::collections::BTreeSet<AssetType>,
        ) -> Result<Vec<AdapterAssetCandidate>, ProviderError> {
            Ok(vec![])
        }
        async fn test_connection(&self) -> ConnectionCheck {
            ConnectionCheck { ok: true, message: "ok".into() }
        }
    }

    #[test]
    fn ordered_by_priority_respects_the_library_list_then_appends_the_rest() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(StubAdapter(ProviderId::Tmdb)));
        registry.register(Arc::new(StubAdapter(ProviderId::FanartTv)));
        registry.register(Arc::new(StubAdapter(ProviderId::Tvdb)));

        let ordered = registry.ordered_by_priority(&[ProviderId::FanartTv, ProviderId::Tmdb]);
        let ids: Vec<_> = ordered.iter().map(|a| a.capabilities().id).collect();

        assert_eq!(ids[0], ProviderId::FanartTv);
        assert_eq!(ids[1], ProviderId::Tmdb);
        assert_eq!(ids.len(), 3);
    }
}
