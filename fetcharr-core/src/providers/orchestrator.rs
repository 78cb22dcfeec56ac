//! §4.D orchestrator: fans a single enrichment request out across enabled
//! adapters and merges their results according to the library's chosen
//! strategy. Asset candidates are always aggregated from every adapter
//! regardless of strategy.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use fetcharr_contracts::provider::{AdapterAssetCandidate, MetadataField, ProviderAdapter};
use fetcharr_model::{EntityType, MediaItem, ProviderId};

use super::registry::ProviderRegistry;
use crate::locks::FieldLockArbiter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestrationStrategy {
    PreferredFirstFillGaps,
    FieldMapping(#[allow(dead_code)] &'static str),
    AggregateAll,
}

#[derive(Debug, Default)]
pub struct OrchestrationResult {
    /// Field name to merged value, already filtered through field locks.
    pub fields: BTreeMap<&'static str, Value>,
    pub assets: Vec<(ProviderId, AdapterAssetCandidate)>,
    pub providers_queried: Vec<ProviderId>,
    pub providers_failed: Vec<ProviderId>,
}

pub struct Orchestrator<'a> {
    registry: &'a ProviderRegistry,
}

impl<'a> Orchestrator<'a> {
    pub fn new(registry: &'a ProviderRegistry) -> Self {
        Self { registry }
    }

    /// `search_ids` maps each adapter's `ProviderId` to the provider-side
    /// result id already resolved for this item (from a prior search or
    /// from stored external ids); adapters with no entry are skipped.
    pub async fn enrich(
        &self,
        item: &MediaItem,
        entity_type: EntityType,
        priority: &[ProviderId],
        strategy: OrchestrationStrategy,
        search_ids: &BTreeMap<ProviderId, String>,
    ) -> OrchestrationResult {
        let adapters = self.registry.ordered_by_priority(priority);
        let mut result = OrchestrationResult::default();

        let mut raw_fields: Vec<(ProviderId, MetadataField, f64)> = Vec::new();

        for adapter in &adapters {
            let id = adapter.capabilities().id;
            let Some(provider_result_id) = search_ids.get(&id) else { continue };
            result.providers_queried.push(id);

            match adapter.get_metadata(entity_type, provider_result_id).await {
                Ok(response) => {
                    for field in response.fields {
                        raw_fields.push((id, field, response.completeness));
                    }
                    if matches!(strategy, OrchestrationStrategy::PreferredFirstFillGaps) {
                        // First adapter to answer under this strategy already set
                        // every field it could; later adapters only fill gaps,
                        // handled below during merge.
                    }
                }
                Err(err) => {
                    warn!(provider = %id, error = %err, "enrichment metadata fetch failed, skipping");
                    result.providers_failed.push(id);
                }
            }

            let asset_types = adapter
                .capabilities()
                .supported_asset_types
                .get(&entity_type)
                .cloned()
                .unwrap_or_default();
            if !asset_types.is_empty() {
                match adapter.get_assets(entity_type, provider_result_id, &asset_types).await {
                    Ok(assets) => result.assets.extend(assets.into_iter().map(|a| (id, a))),
                    Err(err) => {
                        warn!(provider = %id, error = %err, "enrichment asset fetch failed, skipping");
                        if !result.providers_failed.contains(&id) {
                            result.providers_failed.push(id);
                        }
                    }
                }
            }
        }

        result.fields = merge_fields(raw_fields, strategy, priority);

        let arbiter = FieldLockArbiter;
        result.fields.retain(|field, _| !arbiter.is_locked(item, field));

        result
    }
}

fn merge_fields(
    raw: Vec<(ProviderId, MetadataField, f64)>,
    strategy: OrchestrationStrategy,
    priority: &[ProviderId],
) -> BTreeMap<&'static str, Value> {
    let mut merged: BTreeMap<&'static str, (ProviderId, Value, f64)> = BTreeMap::new();

    for (provider, field, completeness) in raw {
        let provider_rank = priority.iter().position(|p| *p == provider).unwrap_or(usize::MAX);

        merged
            .entry(field.name)
            .and_modify(|existing| {
                let should_replace = match strategy {
                    OrchestrationStrategy::PreferredFirstFillGaps => {
                        let existing_rank = priority.iter().position(|p| *p == existing.0).unwrap_or(usize::MAX);
                        provider_rank < existing_rank
                    }
                    OrchestrationStrategy::FieldMapping(_) => false,
                    OrchestrationStrategy::AggregateAll => completeness > existing.2,
                };
                if should_replace {
                    *existing = (provider, field.value.clone(), completeness);
                }
            })
            .or_insert((provider, field.value, completeness));
    }

    merged.into_iter().map(|(name, (_, value, _))| (name, value)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_first_keeps_the_higher_priority_providers_value() {
        let priority = [ProviderId::Tmdb, ProviderId::Tvdb];
        let raw = vec![
            (ProviderId::Tvdb, MetadataField { name: "title", value: "tvdb title".into() }, 1.0),
            (ProviderId::Tmdb, MetadataField { name: "title", value: "tmdb title".into() }, 1.0),
        ];
        let merged = merge_fields(raw, OrchestrationStrategy::PreferredFirstFillGaps, &priority);
        assert_eq!(merged["title"], Value::from("tmdb title"));
    }

    #[test]
    fn aggregate_all_keeps_the_most_complete_response() {
        let priority = [ProviderId::Tmdb, ProviderId::Tvdb];
        let raw = vec![
            (ProviderId::Tmdb, MetadataField { name: "plot", value: "short".into() }, 0.3),
            (ProviderId::Tvdb, MetadataField { name: "plot", value: "longer and better".into() }, 0.9),
        ];
        let merged = merge_fields(raw, OrchestrationStrategy::AggregateAll, &priority);
        assert_eq!(merged["plot"], Value::from("longer and better"));
    }
}
