use serde::{Deserialize, Serialize};

/// §4.A content-addressed cache tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub root_path: String,
    /// §8 scenario 7 / §9 open question: default 90 days for cache orphans.
    pub orphan_grace_days: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root_path: "./data/cache".to_string(),
            orphan_grace_days: 90,
        }
    }
}
