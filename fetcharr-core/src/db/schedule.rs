use async_trait::async_trait;
use fetcharr_model::LibraryId;

use super::PostgresStore;
use crate::error::Result;
use crate::scheduler::ScheduleRepository;

#[async_trait]
impl ScheduleRepository for PostgresStore {
    async fn library_ids_for_periodic_scan(&self) -> Result<Vec<LibraryId>> {
        let ids = sqlx::query_scalar("SELECT id FROM libraries ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}
