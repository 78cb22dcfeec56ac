use serde::{Deserialize, Serialize};

/// §4.O scheduler tunables: how often the cron-like driver checks for due
/// schedules, and the interval for each standard schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// How often the scheduler loop wakes up to check for due entries.
    pub poll_interval_secs: u64,
    /// Daily: disaster-recovery verification pass.
    pub verification_interval_secs: u64,
    /// Daily: orphaned-actor cleanup.
    pub actor_cleanup_interval_secs: u64,
    /// Weekly: cache garbage collection.
    pub cache_gc_interval_secs: u64,
    /// Configurable periodic full library scan.
    pub library_scan_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            verification_interval_secs: 24 * 3600,
            actor_cleanup_interval_secs: 24 * 3600,
            cache_gc_interval_secs: 7 * 24 * 3600,
            library_scan_interval_secs: 24 * 3600,
        }
    }
}
