use crate::enums::MappingScope;
use crate::ids::PathMappingId;
use serde::{Deserialize, Serialize};

/// §3/§4.I `PathMapping`: one (source-prefix, target-prefix) rewrite rule,
/// scoped to either a source-system type (inbound webhooks) or a player
/// group (outbound notifications).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathMapping {
    pub id: PathMappingId,
    pub scope: MappingScope,
    pub source_prefix: String,
    pub target_prefix: String,
}

impl PathMapping {
    pub fn new(scope: MappingScope, source_prefix: impl Into<String>, target_prefix: impl Into<String>) -> Self {
        Self {
            id: PathMappingId::new(),
            scope,
            source_prefix: source_prefix.into(),
            target_prefix: target_prefix.into(),
        }
    }
}
