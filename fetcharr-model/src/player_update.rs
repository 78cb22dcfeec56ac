use crate::enums::{UpdateStatus, UpdateType};
use crate::ids::{MediaPlayerId, PlayerUpdateId};
use serde::{Deserialize, Serialize};

/// §4.J `PlayerUpdate`: one queued scan-or-notification unit of work against
/// a single player, driven by the update-queue processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PlayerUpdate {
    pub id: PlayerUpdateId,
    pub player_id: MediaPlayerId,
    pub update_type: UpdateType,
    pub library_path: String,
    pub status: UpdateStatus,
    pub scheduled_for: chrono::DateTime<chrono::Utc>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub error_message: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl PlayerUpdate {
    pub fn new(player_id: MediaPlayerId, update_type: UpdateType, library_path: impl Into<String>, max_retries: i32) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: PlayerUpdateId::new(),
            player_id,
            update_type,
            library_path: library_path.into(),
            status: UpdateStatus::Queued,
            scheduled_for: now,
            retry_count: 0,
            max_retries,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// §4.J state transition: `queued -> deferred` while the target is mid-playback.
    pub fn defer(&mut self, until: chrono::DateTime<chrono::Utc>) {
        self.status = UpdateStatus::Deferred;
        self.scheduled_for = until;
        self.updated_at = chrono::Utc::now();
    }

    pub fn start_executing(&mut self) {
        self.status = UpdateStatus::Executing;
        self.updated_at = chrono::Utc::now();
    }

    pub fn complete(&mut self) {
        self.status = UpdateStatus::Done;
        self.updated_at = chrono::Utc::now();
    }

    /// §4.J: on execution failure, retry with backoff up to `max_retries`,
    /// else fail terminally.
    pub fn fail(&mut self, message: impl Into<String>, base: chrono::Duration, cap: chrono::Duration) {
        self.error_message = Some(message.into());
        if self.retry_count < self.max_retries {
            let scaled = base * 2i32.saturating_pow(self.retry_count.max(0) as u32);
            self.retry_count += 1;
            self.status = UpdateStatus::Queued;
            self.scheduled_for = chrono::Utc::now() + scaled.min(cap);
        } else {
            self.status = UpdateStatus::Failed;
        }
        self.updated_at = chrono::Utc::now();
    }

    pub fn is_due(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        matches!(self.status, UpdateStatus::Queued | UpdateStatus::Deferred) && self.scheduled_for <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_retries_until_max_then_terminates() {
        let mut update = PlayerUpdate::new(MediaPlayerId::new(), UpdateType::Scan, "/data/Movie", 1);
        update.fail("boom", chrono::Duration::seconds(1), chrono::Duration::minutes(5));
        assert_eq!(update.status, UpdateStatus::Queued);
        assert_eq!(update.retry_count, 1);

        update.fail("boom", chrono::Duration::seconds(1), chrono::Duration::minutes(5));
        assert_eq!(update.status, UpdateStatus::Failed);
    }

    #[test]
    fn deferred_update_is_not_due_until_its_new_time() {
        let mut update = PlayerUpdate::new(MediaPlayerId::new(), UpdateType::Scan, "/data/Movie", 3);
        let later = chrono::Utc::now() + chrono::Duration::minutes(5);
        update.defer(later);
        assert!(!update.is_due(chrono::Utc::now()));
        assert!(update.is_due(later + chrono::Duration::seconds(1)));
    }
}
