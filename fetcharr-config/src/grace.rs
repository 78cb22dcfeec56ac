use serde::{Deserialize, Serialize};

/// §9 open question resolution: grace windows are configurable, defaulting
/// to 30 days for soft-deleted media and 90 days for orphaned cache
/// entries (mirrored in [`crate::cache::CacheConfig::orphan_grace_days`] as
/// the cache's own authoritative copy; this struct is the library-facing
/// default surfaced through settings).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraceWindowsConfig {
    pub media_soft_delete_days: i64,
    pub cache_orphan_days: i64,
}

impl Default for GraceWindowsConfig {
    fn default() -> Self {
        Self {
            media_soft_delete_days: 30,
            cache_orphan_days: 90,
        }
    }
}
