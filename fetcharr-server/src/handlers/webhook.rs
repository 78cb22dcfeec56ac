//! §4.K HTTP entry point. Decodes the normalized webhook shape and
//! immediately enqueues the `webhook-received` job; the response never
//! waits on downstream work (§6: "Response: immediate acknowledgement").

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use fetcharr_contracts::webhook::WebhookPayload;
use fetcharr_core::queue::JobRepository;
use fetcharr_core::webhook;
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;

pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WebhookPayload>,
) -> Result<StatusCode, AppError> {
    let job = webhook::receive(&payload);
    let job_id = job.id;
    state.store.insert(&job).await?;
    info!(job_id = %job_id, source = ?payload.source, event = ?payload.event, "accepted webhook");
    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radarr_download_body_decodes_into_the_normalized_payload() {
        let body = serde_json::json!({
            "source": "radarr",
            "event": "Download",
            "path": "/data/movies/Example (2020)/Example.mkv",
            "tmdb_id": "603",
            "tvdb_id": null,
            "imdb_id": null,
        });
        let payload: WebhookPayload = serde_json::from_value(body).unwrap();
        assert_eq!(payload.path, "/data/movies/Example (2020)/Example.mkv");
        assert_eq!(payload.tmdb_id.as_deref(), Some("603"));
    }

    #[test]
    fn receive_builds_a_critical_priority_job() {
        let payload = WebhookPayload {
            source: fetcharr_model::ManagerKind::Sonarr,
            event: fetcharr_model::WebhookEvent::Upgrade,
            path: "/data/tv/Example/Season 01/Example.S01E01.mkv".into(),
            tmdb_id: None,
            tvdb_id: Some("12345".into()),
            imdb_id: None,
        };
        let job = webhook::receive(&payload);
        assert_eq!(job.job_type, "webhook-received");
        assert_eq!(job.priority, 1);
    }
}
