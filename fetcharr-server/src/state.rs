//! Process wiring: one `PostgresStore`, one `EventBus`, one job queue with
//! every handler registered, and an HTTP client shared across providers,
//! player backends and asset downloads.

use std::sync::Arc;

use fetcharr_config::AppConfig;
use fetcharr_core::cache::{CacheStore, GarbageCollector};
use fetcharr_core::db::PostgresStore;
use fetcharr_core::error::Result;
use fetcharr_core::events::EventBus;
use fetcharr_core::notify::{GroupCoordinator, NotifyGroupHandler, ReqwestBackendResolver, UpdateQueueProcessor};
use fetcharr_core::providers::{FanartTvAdapter, ProviderRegistry, TmdbAdapter};
use fetcharr_core::publish::PublishHandler;
use fetcharr_core::queue::{HandlerRegistry, JobQueue, JobRepository, RetryPolicy};
use fetcharr_core::scan::{DirectoryScanHandler, DownloadAssetHandler, EnrichMetadataHandler, LibraryScanHandler};
use fetcharr_core::scheduler::{ActorCleanupHandler, Scheduler};
use fetcharr_core::verify::VerifyHandler;
use fetcharr_core::webhook::WebhookHandler;

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<PostgresStore>,
    pub events: Arc<EventBus>,
    pub queue: Arc<JobQueue<PostgresStore>>,
    pub providers: Arc<ProviderRegistry>,
    pub http: reqwest::Client,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").field("queue", &"JobQueue<PostgresStore>").finish_non_exhaustive()
    }
}

impl AppState {
    pub async fn connect(config: AppConfig) -> Result<Self> {
        let store = Arc::new(PostgresStore::connect(&config.database).await?);
        let config = fetcharr_core::settings::load_and_apply(config, store.as_ref()).await?;
        let events = Arc::new(EventBus::new(config.event_bus.capacity, config.event_bus.backpressure.into()));
        let http = reqwest::Client::new();

        let providers = Arc::new(build_provider_registry(&config));
        let handlers = build_handler_registry(&store, &providers, &config, &http).await?;

        let queue = Arc::new(JobQueue::new(
            store.clone(),
            handlers,
            events.clone(),
            RetryPolicy { base: chrono::Duration::seconds(config.retry.base_secs as i64), cap: chrono::Duration::seconds(config.retry.cap_secs as i64) },
            config.concurrency.queue_circuit_breaker_threshold,
        ));

        Ok(Self { config, store, events, queue, providers, http })
    }

    /// Background loops: job dispatch workers, the §4.O scheduler, and the
    /// §4.J update-queue processor. Runs until the process is killed.
    pub fn spawn_workers(self: &Arc<Self>) {
        crate::activity_bridge::spawn(self.clone());

        for worker in 0..self.config.concurrency.worker_count.max(1) {
            let state = self.clone();
            tokio::spawn(async move {
                loop {
                    match state.queue.tick().await {
                        Ok(true) => continue,
                        Ok(false) => tokio::time::sleep(std::time::Duration::from_secs(1)).await,
                        Err(err) => {
                            tracing::error!(worker, error = %err, "queue worker tick failed");
                            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                        }
                    }
                }
            });
        }

        let scheduler = Arc::new(Scheduler::new(self.store.clone(), self.store.clone() as Arc<dyn JobRepository>, self.config.schedule));
        tokio::spawn(scheduler.run());

        let resolver = Arc::new(ReqwestBackendResolver::new(self.http.clone()));
        let processor = Arc::new(UpdateQueueProcessor::new(
            self.store.clone(),
            resolver,
            chrono::Duration::minutes(5),
            chrono::Duration::seconds(self.config.retry.base_secs as i64),
            chrono::Duration::seconds(self.config.retry.cap_secs as i64),
        ));
        let state = self.clone();
        let poll = std::time::Duration::from_secs(self.config.schedule.poll_interval_secs);
        let priming_processor = processor.clone();
        tokio::spawn(async move {
            if let Err(err) = prime_known_players(&state, &priming_processor).await {
                tracing::warn!(error = %err, "failed to prime update queue processor's player table");
            }
        });
        tokio::spawn(processor.clone().run_periodic(poll));
        tokio::spawn(processor.run_opportunistic(self.events.clone()));
    }
}

/// `UpdateQueueProcessor` resolves queued updates against an in-memory
/// `MediaPlayerId -> MediaPlayer` table it has no way to populate itself
/// (notify:: has no DB access); this fetches every enabled group's members
/// once at startup so the first periodic tick has something to resolve.
async fn prime_known_players(
    state: &Arc<AppState>,
    processor: &Arc<fetcharr_core::notify::UpdateQueueProcessor<PostgresStore>>,
) -> Result<()> {
    use fetcharr_core::notify::NotifyRepository;
    use fetcharr_core::publish::PublishRepository;

    let mut members = Vec::new();
    for (group_id, _mappings) in PublishRepository::enabled_player_groups(state.store.as_ref()).await? {
        members.extend(NotifyRepository::enabled_members(state.store.as_ref(), group_id).await?);
    }
    processor.prime_members(members);
    Ok(())
}

fn build_provider_registry(config: &AppConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    if let Some(tmdb) = config.providers.providers.get("tmdb") {
        if tmdb.enabled {
            if let Some(api_key) = &tmdb.api_key {
                registry.register(Arc::new(TmdbAdapter::new(api_key.clone(), &tmdb.rate_limit)));
            }
        }
    }
    if let Some(fanart) = config.providers.providers.get("fanart.tv") {
        if fanart.enabled {
            if let Some(api_key) = &fanart.api_key {
                registry.register(Arc::new(FanartTvAdapter::new(api_key.clone(), &fanart.rate_limit)));
            }
        }
    }
    registry
}

async fn build_handler_registry(
    store: &Arc<PostgresStore>,
    providers: &Arc<ProviderRegistry>,
    config: &AppConfig,
    http: &reqwest::Client,
) -> Result<HandlerRegistry> {
    let mut handlers = HandlerRegistry::new();
    let jobs: Arc<dyn JobRepository> = store.clone();
    let cache = Arc::new(CacheStore::new(config.cache.root_path.clone(), store.clone()));

    handlers.register("library-scan", Arc::new(LibraryScanHandler::new(store.clone(), jobs.clone())));
    handlers.register("directory-scan", Arc::new(DirectoryScanHandler::new(store.clone(), jobs.clone(), cache.clone())));
    handlers.register(
        "enrich-metadata",
        Arc::new(EnrichMetadataHandler::new(store.clone(), jobs.clone(), providers.clone(), config.scoring)),
    );
    handlers.register("download-asset", Arc::new(DownloadAssetHandler::new(store.clone(), cache.clone(), http.clone())));
    handlers.register(
        "publish",
        Arc::new(PublishHandler::new(store.clone(), cache.clone(), jobs.clone(), config.completeness.clone(), config.concurrency.max_parallel_publishes)),
    );
    handlers.register("verify", Arc::new(VerifyHandler::new(store.clone(), cache.clone(), jobs.clone())));
    handlers.register("actor-cleanup", Arc::new(ActorCleanupHandler));
    handlers.register("cache-gc", Arc::new(GarbageCollector::new(config.cache.root_path.clone(), store.clone(), chrono::Duration::days(config.cache.orphan_grace_days))));

    let resolver = Arc::new(ReqwestBackendResolver::new(http.clone()));
    let webhook_handler = WebhookHandler::new(store.clone(), jobs.clone(), config.grace.media_soft_delete_days)
        .with_playback_resolver(resolver.clone());
    handlers.register("webhook-received", Arc::new(webhook_handler));

    // §4.J: one `NotifyGroupHandler` per currently-enabled player group, so
    // the flat `notify-<group-id>` job type the webhook/publish fan-out
    // emits always resolves. Groups created after startup need a restart to
    // pick up a handler; acceptable since player topology changes rarely.
    let coordinator = Arc::new(GroupCoordinator::new(store.clone(), resolver, config.retry.default_max_retries));
    for (group_id, _mappings) in fetcharr_core::publish::PublishRepository::enabled_player_groups(store.as_ref()).await? {
        let job_type = NotifyGroupHandler::<PostgresStore>::job_type(group_id);
        handlers.register(job_type, Arc::new(NotifyGroupHandler::new(group_id, coordinator.clone())));
    }

    Ok(handlers)
}
