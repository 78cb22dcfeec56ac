//! Worker process and HTTP surface for fetcharr: job queue runner, webhook
//! intake, and operator CLI. Grounded on the teacher's binary entrypoint
//! shape (config load -> tracing init -> axum serve), retargeted from one
//! monolithic media server onto a `clap` subcommand dispatcher since most
//! of this crate's surface is operator tooling rather than a single
//! always-on HTTP service.

mod activity_bridge;
mod cli;
mod errors;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use clap::Parser;
use fetcharr_config::AppConfig;
use fetcharr_core::db::PostgresStore;
use fetcharr_core::queue::JobRepository;
use fetcharr_model::{Job, JobId, JobStatus, LibraryId, MediaItemId};
use tracing::info;

use cli::{Cli, Command, JobAction};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Job { action } => run_job_action(config, action).await,
        Command::Scan { library_id } => {
            enqueue_simple(&config, "library-scan", priority::AUTO_SCAN, serde_json::json!({ "library_id": LibraryId::from(library_id) })).await
        }
        Command::Enrich { media_item_id } => {
            enqueue_simple(&config, "enrich-metadata", priority::ENRICH, serde_json::json!({ "media_item_id": MediaItemId::from(media_item_id) })).await
        }
        Command::Publish { media_item_id } => {
            enqueue_simple(&config, "publish", priority::PUBLISH, serde_json::json!({ "media_item_id": MediaItemId::from(media_item_id) })).await
        }
        Command::TestProvider { provider_id, query, year } => test_provider(config, &provider_id, &query, year).await,
        Command::TestPlayer { player_id } => test_player(config, player_id).await,
    }
}

/// User-triggered priorities, one band above their webhook-fan-out
/// counterparts per §4.L's priority table.
mod priority {
    pub const AUTO_SCAN: i16 = 2;
    pub const ENRICH: i16 = 3;
    pub const PUBLISH: i16 = 4;
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let bind_addr = config.server.bind_addr.clone();
    let state = Arc::new(AppState::connect(config).await?);
    state.queue.recover_crashed().await?;
    state.spawn_workers();

    let router = routes::build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(%bind_addr, "fetcharr server listening");
    axum::serve(listener, router).await?;
    Ok(())
}

async fn enqueue_simple(config: &AppConfig, job_type: &str, priority: i16, payload: serde_json::Value) -> anyhow::Result<()> {
    let store = PostgresStore::connect(&config.database).await?;
    let job = Job::new(job_type, priority, payload);
    let job_id = job.id;
    store.insert(&job).await?;
    println!("enqueued {job_type} job {job_id}");
    Ok(())
}

async fn run_job_action(config: AppConfig, action: JobAction) -> anyhow::Result<()> {
    let store = PostgresStore::connect(&config.database).await?;
    match action {
        JobAction::List { status, limit } => {
            let status: JobStatus = serde_json::from_value(serde_json::Value::String(status.clone()))
                .map_err(|_| anyhow::anyhow!("unknown job status {status}"))?;
            let jobs = store.list_by_status(status, limit).await?;
            for job in jobs {
                println!("{}  {:<20}  prio={}  retry={}/{}  {:?}", job.id, job.job_type, job.priority, job.retry_count, job.max_retries, job.status);
            }
        }
        JobAction::Retry { job_id } => {
            let id = JobId::from(job_id);
            let mut job = store.fetch(id).await?.ok_or_else(|| anyhow::anyhow!("job {id} not found"))?;
            job.status = JobStatus::Pending;
            job.retry_count = 0;
            job.next_retry_at = None;
            job.error_message = None;
            store.update(&job).await?;
            println!("job {id} reset to pending");
        }
        JobAction::Cancel { job_id } => {
            let id = JobId::from(job_id);
            let mut job = store.fetch(id).await?.ok_or_else(|| anyhow::anyhow!("job {id} not found"))?;
            job.status = JobStatus::Cancelled;
            store.update(&job).await?;
            println!("job {id} cancelled");
        }
    }
    Ok(())
}

async fn test_provider(config: AppConfig, provider_id: &str, query: &str, year: Option<i32>) -> anyhow::Result<()> {
    let state = AppState::connect(config).await?;
    let id: fetcharr_model::ProviderId = serde_json::from_value(serde_json::Value::String(provider_id.to_string()))
        .map_err(|_| anyhow::anyhow!("unknown provider {provider_id}"))?;
    let adapter = state.providers.get(id).ok_or_else(|| anyhow::anyhow!("provider {provider_id} is not configured (missing api key?)"))?;

    let check = adapter.test_connection().await;
    println!("connection: {} ({})", if check.ok { "ok" } else { "failed" }, check.message);
    if !check.ok {
        return Ok(());
    }

    let results = adapter.search(query, year, &Default::default()).await?;
    for result in results {
        println!("{}  {}  ({})", result.provider_result_id, result.title, result.year.map(|y| y.to_string()).unwrap_or_default());
    }
    Ok(())
}

async fn test_player(config: AppConfig, player_id: uuid::Uuid) -> anyhow::Result<()> {
    let store = PostgresStore::connect(&config.database).await?;
    let player = store.player_by_id(fetcharr_model::MediaPlayerId::from(player_id)).await?.ok_or_else(|| anyhow::anyhow!("player {player_id} not found"))?;
    let backend = fetcharr_core::notify::build_backend(&player, reqwest::Client::new(), None);
    let state = backend.probe_playback_state().await?;
    println!("{}: {:?}", player.name, state);
    Ok(())
}
