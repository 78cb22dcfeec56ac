//! §6 configuration precedence chain for fetcharr: process env < on-disk
//! TOML file < DB `settings` table runtime overrides. The first two layers
//! are implemented here; the DB layer is applied by `fetcharr-core` via
//! [`settings::apply_settings_overrides`] once it has a pool to read the
//! `settings` table from.

pub mod cache;
pub mod cli;
pub mod completeness;
pub mod concurrency;
pub mod database;
pub mod error;
pub mod grace;
pub mod notify;
pub mod provider;
pub mod schedule;
pub mod scoring;
pub mod server;
pub mod settings;
pub mod util;

pub use cache::CacheConfig;
pub use completeness::{CompletenessConfig, RequiredFields};
pub use concurrency::{ConcurrencyConfig, RetryConfig};
pub use database::DatabaseConfig;
pub use error::{ConfigError, Result};
pub use grace::GraceWindowsConfig;
pub use notify::NotifyConfig;
pub use provider::{ProviderConfig, ProviderRateLimit, ProvidersConfig};
pub use schedule::ScheduleConfig;
pub use scoring::{ScoringConfig, ScoringWeights};
pub use server::{EventBusBackpressure, EventBusConfig, ServerConfig};
pub use settings::{apply_settings_overrides, SettingsOverride};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The complete, merged configuration tree. Every field has a default, so
/// any subset can be overridden from the env/file/DB layers without the
/// others needing to be specified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub concurrency: ConcurrencyConfig,
    pub retry: RetryConfig,
    pub providers: ProvidersConfig,
    pub scoring: ScoringConfig,
    pub completeness: CompletenessConfig,
    pub grace: GraceWindowsConfig,
    pub database: DatabaseConfig,
    pub notify: NotifyConfig,
    pub server: ServerConfig,
    pub event_bus: EventBusConfig,
    pub schedule: ScheduleConfig,
}

/// Where a field of the final [`AppConfig`] came from; surfaced for
/// diagnostics (e.g. `fetcharr-server`'s startup log line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Defaults,
    File,
    Env,
}

impl AppConfig {
    /// Layer 1 of §6's precedence chain: defaults overridden by process
    /// environment variables. Mirrors the teacher's own `FOO_CONFIG_PATH` /
    /// `FOO_CONFIG_JSON` / individual-var convention (see [`util`]).
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = util::env_var("FETCHARR_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(n) = util::env_var_parsed::<u32>("FETCHARR_DB_MAX_CONNECTIONS") {
            self.database.max_connections = n;
        }
        if let Some(n) = util::env_var_parsed::<u32>("FETCHARR_DB_MIN_CONNECTIONS") {
            self.database.min_connections = n;
        }
        if let Some(root) = util::env_var("FETCHARR_CACHE_ROOT") {
            self.cache.root_path = root;
        }
        if let Some(n) = util::env_var_parsed::<i64>("FETCHARR_CACHE_GRACE_DAYS") {
            self.cache.orphan_grace_days = n;
        }
        if let Some(n) = util::env_var_parsed::<usize>("FETCHARR_WORKER_COUNT") {
            self.concurrency.worker_count = n;
        }
        if let Some(addr) = util::env_var("FETCHARR_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(key) = util::env_var("FETCHARR_TMDB_API_KEY") {
            let entry = self.providers.providers.entry("tmdb".to_string()).or_default();
            entry.enabled = true;
            entry.api_key = Some(key);
        }
        if let Some(key) = util::env_var("FETCHARR_FANART_API_KEY") {
            let entry = self.providers.providers.entry("fanart.tv".to_string()).or_default();
            entry.enabled = true;
            entry.api_key = Some(key);
        }
    }

    /// Layer 2: merge a TOML file on top of whatever this config already
    /// holds. The file need not specify every field; `#[serde(default)]`
    /// on every sub-struct means a partial file only overrides what it
    /// names.
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path).map_err(|source| error::ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let file_config: AppConfig = toml::from_str(&contents).map_err(|source| error::ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        *self = file_config;
        Ok(())
    }

    /// The full non-DB precedence chain: defaults, then an optional TOML
    /// file (if present on disk), then process env. `dotenvy` is consulted
    /// first the way the teacher's binaries do, so a `.env` file can seed
    /// the process environment before it is read.
    pub fn load(file_path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = AppConfig::default();

        if let Some(path) = file_path.map(Path::to_path_buf).or_else(default_file_path) {
            if path.exists() {
                config.merge_file(&path)?;
            }
        }

        config.apply_env_overrides();

        if !config.scoring.weights.sums_to_one() {
            return Err(error::ConfigError::Invalid(
                "scoring.weights must sum to 1.0".to_string(),
            ));
        }

        Ok(config)
    }
}

fn default_file_path() -> Option<PathBuf> {
    const CANDIDATES: &[&str] = &["fetcharr.toml", "config/fetcharr.toml"];
    CANDIDATES.iter().map(PathBuf::from).find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_satisfy_weight_invariant() {
        assert!(AppConfig::default().scoring.weights.sums_to_one());
    }

    #[test]
    fn file_merge_overrides_only_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fetcharr.toml");
        std::fs::write(&path, "[cache]\nroot_path = \"/data/cache\"\n").unwrap();

        let mut config = AppConfig::default();
        config.merge_file(&path).unwrap();

        assert_eq!(config.cache.root_path, "/data/cache");
        assert_eq!(config.concurrency.worker_count, ConcurrencyConfig::default().worker_count);
    }
}
