//! §4.M field-lock arbiter: the single chokepoint every automated writer
//! (enrichment merge, auto-selection, bulk operation) must pass a field
//! write through. Locking is binary; there is no ownership history.

use tracing::debug;

use fetcharr_model::{AssetType, MediaItem};

#[derive(Debug, Clone, Copy, Default)]
pub struct FieldLockArbiter;

impl FieldLockArbiter {
    pub fn is_locked(&self, item: &MediaItem, field: &str) -> bool {
        item.field_locks.is_locked(field)
    }

    pub fn is_asset_locked(&self, item: &MediaItem, asset_type: AssetType) -> bool {
        item.is_asset_locked(asset_type)
    }

    /// Applies an automated write to `field`, skipping (and logging) it if
    /// locked. Returns whether the write happened.
    pub fn try_write<T>(&self, item: &MediaItem, field: &'static str, apply: impl FnOnce() -> T) -> Option<T> {
        if self.is_locked(item, field) {
            debug!(media_item_id = %item.id, field, "skipped locked field write");
            return None;
        }
        Some(apply())
    }

    /// A user edit always wins and locks the field behind it, restoring
    /// automation only via an explicit unlock.
    pub fn apply_user_edit(&self, item: &mut MediaItem, field: &'static str, apply: impl FnOnce(&mut MediaItem)) {
        apply(item);
        item.field_locks.lock(field);
    }

    pub fn unlock(&self, item: &mut MediaItem, field: &'static str) {
        item.field_locks.unlock(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetcharr_model::{EntityType, LibraryId};

    fn sample_item() -> MediaItem {
        MediaItem::new(LibraryId::new(), EntityType::Movie, "Example".to_string(), "/library/example".to_string())
    }

    #[test]
    fn locked_field_write_is_skipped() {
        let mut item = sample_item();
        item.field_locks.lock("title");
        let arbiter = FieldLockArbiter;

        let result = arbiter.try_write(&item, "title", || "new title".to_string());
        assert_eq!(result, None);
    }

    #[test]
    fn unlocked_field_write_runs() {
        let item = sample_item();
        let arbiter = FieldLockArbiter;
        let result = arbiter.try_write(&item, "title", || "new title".to_string());
        assert_eq!(result, Some("new title".to_string()));
    }

    #[test]
    fn user_edit_overwrites_and_locks() {
        let mut item = sample_item();
        let arbiter = FieldLockArbiter;
        arbiter.apply_user_edit(&mut item, "plot", |item| item.metadata.plot = Some("user plot".into()));

        assert_eq!(item.metadata.plot.as_deref(), Some("user plot"));
        assert!(item.field_locks.is_locked("plot"));

        arbiter.unlock(&mut item, "plot");
        assert!(!item.field_locks.is_locked("plot"));
    }
}
