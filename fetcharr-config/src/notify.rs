use serde::{Deserialize, Serialize};

/// §4.J player notification / update-queue-processor tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub update_queue_poll_interval_secs: u64,
    pub max_retries: i32,
    pub retry_backoff_base_secs: u64,
    /// §4.J step 4: postpone a `scan` update by this long while the target
    /// is still playing.
    pub playing_postpone_secs: u64,
    pub singleton_notify_max_retries: i32,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            update_queue_poll_interval_secs: 30,
            max_retries: 3,
            retry_backoff_base_secs: 5,
            playing_postpone_secs: 300,
            singleton_notify_max_retries: 3,
        }
    }
}
