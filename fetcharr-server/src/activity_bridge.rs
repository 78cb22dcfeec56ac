//! Turns a slice of the in-process event bus into rows in the append-only
//! activity log, so the CLI's history view has something to show without
//! every job handler needing its own `PostgresStore` handle. Grounded on
//! the same "subscribe, translate, persist" shape
//! `notify::UpdateQueueProcessor::run_opportunistic` uses for
//! `Event::PlaybackStopped`.

use std::sync::Arc;

use fetcharr_core::events::Event;
use fetcharr_core::templates;
use fetcharr_model::ActivityLogEntry;
use tracing::warn;

use crate::state::AppState;

pub fn spawn(state: Arc<AppState>) {
    let mut rx = state.events.subscribe();
    tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            };

            let Some(entry) = entry_for(event) else { continue };
            if let Err(err) = state.store.activity_log().record(&entry).await {
                warn!(error = %err, "failed to persist activity log entry");
            }
        }
    });
}

fn entry_for(event: Event) -> Option<ActivityLogEntry> {
    match event {
        Event::JobCompleted { job_id } => {
            let message = templates::substitute("job {{job_id}} completed", &serde_json::json!({ "job_id": job_id }));
            Some(ActivityLogEntry::new("job_completed", message))
        }
        Event::JobFailed { job_id, error } => {
            let message = templates::substitute(
                "job {{job_id}} failed: {{error}}",
                &serde_json::json!({ "job_id": job_id, "error": error }),
            );
            Some(ActivityLogEntry::new("job_failed", message))
        }
        Event::ActivityLogged { media_item_id, event, message } => {
            let entry = ActivityLogEntry::new(event, message);
            Some(match media_item_id {
                Some(id) => entry.for_media_item(id),
                None => entry,
            })
        }
        Event::JobProgress { .. } | Event::MediaItemUpdated { .. } | Event::PlaybackStopped { .. } => None,
    }
}
