//! §7 error taxonomy: every handler-visible failure classifies into one of
//! these kinds, never a one-off ad-hoc type, so retry/circuit-breaker/
//! terminal-failure policy can dispatch on the variant alone.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Timeout, 5xx, DNS — retried with backoff, counts against the
    /// circuit breaker.
    #[error("transient failure: {0}")]
    Transient(String),

    /// 429 / bucket timeout — sleep to reset, retry is transparent to the
    /// caller.
    #[error("rate limited{}", retry_after_secs.map(|s| format!(", retry after {s}s")).unwrap_or_default())]
    RateLimit { retry_after_secs: Option<u64> },

    /// 401/403, missing key — fails terminally and disables the provider.
    #[error("auth or configuration error: {0}")]
    Auth(String),

    /// 404 on metadata lookup — non-error at the orchestrator level, but
    /// still surfaced here so callers can record "no result" explicitly.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid payload, missing required field — fails the job terminally,
    /// never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Hash mismatch, DB constraint violation — fails terminally, surfaced
    /// as a critical event.
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// Disk full, permission denied, missing root — retried a few times;
    /// if persistent, opens the queue-wide circuit breaker.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// User-initiated cancellation — handler terminates cleanly, partial
    /// state stays consistent.
    #[error("operation cancelled")]
    Cancelled,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("provider error: {0}")]
    Provider(#[from] fetcharr_contracts::provider::ProviderError),

    #[error("player error: {0}")]
    Player(#[from] fetcharr_contracts::player::PlayerError),

    #[error("configuration error: {0}")]
    Config(#[from] fetcharr_config::ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// §7 propagation policy: transient-shaped errors are retried by the
    /// job queue; everything else fails the attempt terminally.
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Transient(_) | CoreError::RateLimit { .. } | CoreError::Io(_) => true,
            CoreError::Database(_) => true,
            CoreError::Provider(err) => matches!(
                err,
                fetcharr_contracts::provider::ProviderError::Transient(_)
                    | fetcharr_contracts::provider::ProviderError::RateLimited { .. }
            ),
            CoreError::Player(err) => matches!(err, fetcharr_contracts::player::PlayerError::Transient(_)),
            CoreError::Auth(_)
            | CoreError::NotFound(_)
            | CoreError::Validation(_)
            | CoreError::Integrity(_)
            | CoreError::Cancelled
            | CoreError::Config(_)
            | CoreError::Serialization(_)
            | CoreError::Internal(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
