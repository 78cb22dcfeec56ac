use serde::{Deserialize, Serialize};

/// §5 concurrency & resource model tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// §4.L dispatch pool size.
    pub worker_count: usize,
    /// §5: bounded per-asset-download concurrency, default 10.
    pub max_parallel_asset_downloads: usize,
    /// §4.H: bulk publish concurrency bound, default 4.
    pub max_parallel_publishes: usize,
    /// §4.L: consecutive job failures of any type before the queue-wide
    /// circuit breaker opens, default 5.
    pub queue_circuit_breaker_threshold: u32,
    /// §4.L: queue-wide circuit breaker cooldown.
    pub queue_circuit_breaker_cooldown_secs: u64,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            max_parallel_asset_downloads: 10,
            max_parallel_publishes: 4,
            queue_circuit_breaker_threshold: 5,
            queue_circuit_breaker_cooldown_secs: 60,
        }
    }
}

/// §4.L retry backoff tunables (`base * 2^n`, capped).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub base_secs: u64,
    pub cap_secs: u64,
    pub default_max_retries: i32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_secs: 1,
            cap_secs: 300,
            default_max_retries: 3,
        }
    }
}
