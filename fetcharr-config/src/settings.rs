//! §6: "process env < on-disk config < DB `settings` table (runtime
//! overrides)". The DB table itself lives in `fetcharr-core::db` (this
//! crate has no database dependency); a settings row is just a dotted
//! key plus a JSON value, applied here as the final layer over whatever
//! [`crate::AppConfig`] the env/file layers produced.

use crate::error::{ConfigError, Result};
use crate::AppConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsOverride {
    /// Dotted path into the config tree, e.g. `"scoring.weights.w_resolution"`.
    pub key: String,
    pub value: serde_json::Value,
}

/// Applies each override in order by walking a dotted path into the JSON
/// projection of `base` and replacing the value there, then re-deserializing
/// into `AppConfig`. Overrides targeting an unknown path are rejected
/// rather than silently ignored, since a typo in the `settings` table
/// should surface immediately rather than fail to apply.
pub fn apply_settings_overrides(base: &AppConfig, overrides: &[SettingsOverride]) -> Result<AppConfig> {
    let mut value = serde_json::to_value(base)
        .map_err(|e| ConfigError::Invalid(format!("could not serialize base config: {e}")))?;

    for over in overrides {
        set_path(&mut value, &over.key, over.value.clone())
            .map_err(|_| ConfigError::InvalidOverride(over.key.clone()))?;
    }

    serde_json::from_value(value).map_err(|e| ConfigError::Invalid(format!("overrides produced an invalid config: {e}")))
}

fn set_path(root: &mut serde_json::Value, dotted: &str, new_value: serde_json::Value) -> std::result::Result<(), ()> {
    let mut cursor = root;
    let segments: Vec<&str> = dotted.split('.').collect();
    let (last, rest) = segments.split_last().ok_or(())?;

    for segment in rest {
        cursor = cursor.as_object_mut().ok_or(())?.get_mut(*segment).ok_or(())?;
    }

    let obj = cursor.as_object_mut().ok_or(())?;
    if !obj.contains_key(*last) {
        return Err(());
    }
    obj.insert((*last).to_string(), new_value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_replaces_a_nested_field() {
        let base = AppConfig::default();
        let overrides = vec![SettingsOverride {
            key: "scoring.max_count".to_string(),
            value: serde_json::json!(3),
        }];
        let merged = apply_settings_overrides(&base, &overrides).unwrap();
        assert_eq!(merged.scoring.max_count, 3);
    }

    #[test]
    fn override_of_unknown_path_is_rejected() {
        let base = AppConfig::default();
        let overrides = vec![SettingsOverride {
            key: "scoring.not_a_real_field".to_string(),
            value: serde_json::json!(3),
        }];
        assert!(apply_settings_overrides(&base, &overrides).is_err());
    }
}
