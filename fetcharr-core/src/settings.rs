//! §6, layer 3: the DB `settings` table is the last link in the
//! precedence chain that `fetcharr-config` documents but can't apply
//! itself (that crate has no database dependency). A repository trait
//! here keeps the table access behind the same seam every other
//! subsystem uses, and [`load_and_apply`] is the one call `fetcharr-server`
//! makes at startup once it has a connected store.

use async_trait::async_trait;
use fetcharr_config::{apply_settings_overrides, AppConfig, SettingsOverride};

use crate::error::Result;

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// All rows in the `settings` table, in no particular order;
    /// [`apply_settings_overrides`] applies them in the order given.
    async fn load_settings(&self) -> Result<Vec<SettingsOverride>>;
}

/// Reads every override from `repo` and layers it on top of `base`.
/// A malformed override (unknown dotted path, type mismatch) fails the
/// whole load rather than applying a partial config, since a config the
/// operator didn't intend to ship is worse than a process that refuses
/// to start.
pub async fn load_and_apply<R: SettingsRepository + ?Sized>(base: AppConfig, repo: &R) -> Result<AppConfig> {
    let overrides = repo.load_settings().await?;
    if overrides.is_empty() {
        return Ok(base);
    }
    Ok(apply_settings_overrides(&base, &overrides)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSettings(Vec<SettingsOverride>);

    #[async_trait]
    impl SettingsRepository for FakeSettings {
        async fn load_settings(&self) -> Result<Vec<SettingsOverride>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn empty_table_leaves_the_base_config_untouched() {
        let base = AppConfig::default();
        let applied = load_and_apply(base.clone(), &FakeSettings(Vec::new())).await.unwrap();
        assert_eq!(applied, base);
    }

    #[tokio::test]
    async fn a_row_overrides_the_matching_field() {
        let base = AppConfig::default();
        let repo = FakeSettings(vec![SettingsOverride { key: "scoring.max_count".to_string(), value: serde_json::json!(5) }]);
        let applied = load_and_apply(base, &repo).await.unwrap();
        assert_eq!(applied.scoring.max_count, 5);
    }
}
