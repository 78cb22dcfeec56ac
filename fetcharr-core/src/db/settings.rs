use async_trait::async_trait;
use fetcharr_config::SettingsOverride;

use super::PostgresStore;
use crate::error::Result;
use crate::settings::SettingsRepository;

#[async_trait]
impl SettingsRepository for PostgresStore {
    async fn load_settings(&self) -> Result<Vec<SettingsOverride>> {
        let rows: Vec<(String, serde_json::Value)> =
            sqlx::query_as("SELECT key, value FROM settings").fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(key, value)| SettingsOverride { key, value }).collect())
    }
}
