//! §4.C rate-limited HTTP client: one [`ProviderHttpClient`] per configured
//! provider, composing a `governor` token bucket, a `failsafe` circuit
//! breaker, and `backon` exponential backoff. Grounded on the teacher
//! pack's `resilience.rs`, which re-exports the same three crates for the
//! same purpose against a different backend (DB/Redis/gRPC rather than
//! provider HTTP).

use std::num::NonZeroU32;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use failsafe::{backoff, failure_policy, Config, StateMachine};
use governor::{Quota, RateLimiter};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use tracing::warn;

use crate::error::{CoreError, Result};
use fetcharr_config::ProviderRateLimit;

type Breaker = StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>;
type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Wraps a plain `reqwest::Client` with the per-provider resilience policy.
/// `send` takes a closure that performs the actual request so retries can
/// rebuild the request each attempt (a `reqwest::Request` cannot be cloned
/// once consumed).
pub struct ProviderHttpClient {
    provider_label: String,
    limiter: Limiter,
    breaker: Breaker,
    bucket_timeout: Duration,
    retry_base: Duration,
    retry_cap: Duration,
}

impl std::fmt::Debug for ProviderHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHttpClient").field("provider", &self.provider_label).finish()
    }
}

impl ProviderHttpClient {
    pub fn new(provider_label: impl Into<String>, config: &ProviderRateLimit) -> Self {
        let rps = NonZeroU32::new(config.requests_per_second.max(1.0).round() as u32)
            .unwrap_or(NonZeroU32::new(1).unwrap());
        let burst = NonZeroU32::new(config.burst_capacity.max(1)).unwrap_or(NonZeroU32::new(1).unwrap());
        let quota = Quota::per_second(rps).allow_burst(burst);

        let breaker = Config::new()
            .failure_policy(failure_policy::consecutive_failures(
                config.circuit_breaker_threshold,
                backoff::exponential(
                    Duration::from_secs(config.circuit_breaker_cooldown_secs),
                    Duration::from_secs(config.circuit_breaker_cooldown_secs * 8),
                ),
            ))
            .build();

        Self {
            provider_label: provider_label.into(),
            limiter: RateLimiter::direct(quota),
            breaker,
            bucket_timeout: Duration::from_secs(config.bucket_timeout_secs),
            retry_base: Duration::from_secs(config.retry_backoff_base_secs),
            retry_cap: Duration::from_secs(config.retry_backoff_cap_secs),
        }
    }

    /// Runs `op` under the bucket, breaker, and retry policy. `op` must
    /// classify its own failures into [`CoreError`] so retryability can be
    /// read off [`CoreError::is_retryable`].
    pub async fn call<F, Fut, T>(&self, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        if !self.breaker.is_call_permitted() {
            return Err(CoreError::Transient(format!(
                "circuit breaker open for provider {}",
                self.provider_label
            )));
        }

        if tokio::time::timeout(self.bucket_timeout, self.limiter.until_ready()).await.is_err() {
            return Err(CoreError::RateLimit { retry_after_secs: Some(self.bucket_timeout.as_secs()) });
        }

        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.retry_base)
            .with_max_delay(self.retry_cap)
            .with_jitter();

        let result = (|| op())
            .retry(backoff)
            .when(|err: &CoreError| err.is_retryable())
            .await;

        match result {
            Ok(value) => {
                self.breaker.on_success();
                Ok(value)
            }
            Err(err) => {
                if err.is_retryable() {
                    self.breaker.on_error();
                }
                warn!(provider = %self.provider_label, error = %err, "provider call failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> ProviderRateLimit {
        ProviderRateLimit {
            requests_per_second: 100.0,
            burst_capacity: 100,
            bucket_timeout_secs: 1,
            request_timeout_secs: 1,
            circuit_breaker_threshold: 2,
            circuit_breaker_cooldown_secs: 60,
            retry_backoff_base_secs: 0,
            retry_backoff_cap_secs: 1,
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let client = ProviderHttpClient::new("test", &fast_config());
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result = client
            .call(|| {
                let attempts = attempts_clone.clone();
                async move {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(CoreError::Transient("boom".into()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(result, 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn validation_errors_are_not_retried() {
        let client = ProviderHttpClient::new("test", &fast_config());
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result: Result<()> = client
            .call(|| {
                let attempts = attempts_clone.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(CoreError::Validation("bad payload".into()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeated_failures_open_the_circuit_breaker() {
        let client = ProviderHttpClient::new("test", &fast_config());
        for _ in 0..2 {
            let _: Result<()> = client.call(|| async { Err(CoreError::Transient("boom".into())) }).await;
        }

        let result: Result<()> = client.call(|| async { Ok(()) }).await;
        assert!(matches!(result, Err(CoreError::Transient(_))));
    }
}
