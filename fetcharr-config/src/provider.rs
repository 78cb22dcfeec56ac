use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// §4.C per-provider rate limiter / retry / circuit breaker tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderRateLimit {
    pub requests_per_second: f64,
    pub burst_capacity: u32,
    /// Cooperative wait before failing with `RateLimitTimeout`.
    pub bucket_timeout_secs: u64,
    /// Per-call deadline; exceeding it is a transient failure (§5).
    pub request_timeout_secs: u64,
    /// Consecutive failures before the breaker opens, default 5.
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_cooldown_secs: u64,
    pub retry_backoff_base_secs: u64,
    pub retry_backoff_cap_secs: u64,
}

impl Default for ProviderRateLimit {
    fn default() -> Self {
        Self {
            requests_per_second: 4.0,
            burst_capacity: 8,
            bucket_timeout_secs: 10,
            request_timeout_secs: 10,
            circuit_breaker_threshold: 5,
            circuit_breaker_cooldown_secs: 60,
            retry_backoff_base_secs: 1,
            retry_backoff_cap_secs: 60,
        }
    }
}

/// §4.C/§4.D: one entry per enabled provider, plus API credentials and
/// per-provider overrides of the default rate limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub rate_limit: ProviderRateLimit,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            rate_limit: ProviderRateLimit::default(),
        }
    }
}

/// Keyed by the lowercase provider id (`"tmdb"`, `"fanart.tv"`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub providers: BTreeMap<String, ProviderConfig>,
}
