//! §4.J player notifier + group coordinator: translating a publish into
//! concrete "rescan this path" calls against Kodi/Jellyfin/Plex, with the
//! singleton-vs-unlimited-group fan-out rules and a backoff-driven update
//! queue for the calls that fail or land mid-playback.
//!
//! Grounded on `queue::JobQueue` for the retry/backoff shape (`PlayerUpdate`
//! mirrors `Job`'s `retry_count`/`max_retries`/backoff fields deliberately)
//! and on `crate::events::EventBus` for the opportunistic-kick signal.

mod backends;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};

use fetcharr_contracts::player::{PlaybackState, PlayerBackend};
use fetcharr_model::{Job, MediaPlayer, PlayerGroup, PlayerGroupId, PlayerUpdate, UpdateType};

use crate::error::{CoreError, Result};
use crate::events::{Event, EventBus};
use crate::queue::{JobContext, JobHandler};

pub use backends::build as build_backend;

#[async_trait]
pub trait NotifyRepository: Send + Sync {
    async fn group(&self, id: PlayerGroupId) -> Result<Option<PlayerGroup>>;
    async fn enabled_members(&self, group_id: PlayerGroupId) -> Result<Vec<MediaPlayer>>;
    async fn enqueue_update(&self, update: &PlayerUpdate) -> Result<()>;
    async fn due_updates(&self, now: chrono::DateTime<chrono::Utc>) -> Result<Vec<PlayerUpdate>>;
    async fn save_update(&self, update: &PlayerUpdate) -> Result<()>;
}

/// Resolves the live [`PlayerBackend`] for a [`MediaPlayer`] row. A trait
/// rather than a free function so `crate::db`'s concrete per-player api-key
/// lookup can be swapped in without `notify::` depending on storage.
pub trait BackendResolver: Send + Sync {
    fn resolve(&self, player: &MediaPlayer) -> Arc<dyn PlayerBackend>;
}

pub struct ReqwestBackendResolver {
    client: reqwest::Client,
}

impl ReqwestBackendResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl BackendResolver for ReqwestBackendResolver {
    fn resolve(&self, player: &MediaPlayer) -> Arc<dyn PlayerBackend> {
        backends::build(player, self.client.clone(), None)
    }
}

/// §4.J group-oriented notification fan-out, given an already
/// path-translated `library_path` (translation happens at enqueue time in
/// `publish::`, since it needs the group's mappings which `publish::`
/// already fetches).
pub struct GroupCoordinator<R: NotifyRepository> {
    repo: Arc<R>,
    resolver: Arc<dyn BackendResolver>,
    singleton_max_retries: i32,
    low_priority_max_retries: i32,
}

impl<R: NotifyRepository> std::fmt::Debug for GroupCoordinator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupCoordinator").finish_non_exhaustive()
    }
}

impl<R: NotifyRepository> GroupCoordinator<R> {
    pub fn new(repo: Arc<R>, resolver: Arc<dyn BackendResolver>, singleton_max_retries: i32) -> Self {
        Self { repo, resolver, singleton_max_retries, low_priority_max_retries: 1 }
    }

    pub async fn notify(&self, group_id: PlayerGroupId, library_path: &str) -> Result<()> {
        let group = self
            .repo
            .group(group_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("player group {group_id}")))?;
        let members = self.repo.enabled_members(group_id).await?;
        if members.is_empty() {
            return Ok(());
        }

        if group.is_singleton() {
            return self.notify_singleton(&members[0], library_path).await;
        }

        self.notify_unlimited(&members, library_path).await
    }

    async fn notify_singleton(&self, member: &MediaPlayer, library_path: &str) -> Result<()> {
        let backend = self.resolver.resolve(member);
        match backend.notify_library_changed(library_path).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(player = %member.name, error = %err, "singleton player notify failed, queueing retry");
                let update = PlayerUpdate::new(member.id, UpdateType::Scan, library_path, self.singleton_max_retries);
                self.repo.enqueue_update(&update).await
            }
        }
    }

    /// §4.J step 3: probe every member, pick a primary, scan it (now or
    /// deferred), defer every other playing member, and queue a low
    /// priority cache-refresh notification for everyone.
    async fn notify_unlimited(&self, members: &[MediaPlayer], library_path: &str) -> Result<()> {
        let probes = join_all(members.iter().map(|member| {
            let backend = self.resolver.resolve(member);
            async move { backend.probe_playback_state().await.unwrap_or(PlaybackState::Unknown) }
        }))
        .await;

        let idle_index = probes.iter().position(|state| matches!(state, PlaybackState::Idle));
        let primary_index = match idle_index {
            Some(i) => i,
            None => {
                let mut best = 0;
                let mut best_len = usize::MAX;
                for (i, member) in members.iter().enumerate() {
                    let len = self.resolver.resolve(member).pending_queue_len().await;
                    if len < best_len {
                        best_len = len;
                        best = i;
                    }
                }
                best
            }
        };

        for (i, member) in members.iter().enumerate() {
            if i == primary_index {
                if matches!(probes[i], PlaybackState::Idle) {
                    let backend = self.resolver.resolve(member);
                    if let Err(err) = backend.notify_library_changed(library_path).await {
                        warn!(player = %member.name, error = %err, "primary scan failed, queueing retry");
                        let update = PlayerUpdate::new(member.id, UpdateType::Scan, library_path, self.singleton_max_retries);
                        self.repo.enqueue_update(&update).await?;
                    }
                } else {
                    let update = PlayerUpdate::new(member.id, UpdateType::Scan, library_path, self.singleton_max_retries);
                    self.repo.enqueue_update(&update).await?;
                }
            } else if matches!(probes[i], PlaybackState::Playing) {
                let update = PlayerUpdate::new(member.id, UpdateType::Scan, library_path, self.singleton_max_retries);
                self.repo.enqueue_update(&update).await?;
            }

            let notification = PlayerUpdate::new(member.id, UpdateType::Notification, library_path, self.low_priority_max_retries);
            self.repo.enqueue_update(&notification).await?;
        }

        Ok(())
    }
}

#[derive(serde::Deserialize)]
struct NotifyPayload {
    library_path: String,
}

/// One instance bound to a single group at registry time, since job types
/// are dispatched by the flat `notify-<group-id>` string the webhook/publish
/// fan-out emits.
pub struct NotifyGroupHandler<R: NotifyRepository> {
    group_id: PlayerGroupId,
    coordinator: Arc<GroupCoordinator<R>>,
}

impl<R: NotifyRepository> std::fmt::Debug for NotifyGroupHandler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyGroupHandler").field("group_id", &self.group_id).finish_non_exhaustive()
    }
}

impl<R: NotifyRepository> NotifyGroupHandler<R> {
    pub fn new(group_id: PlayerGroupId, coordinator: Arc<GroupCoordinator<R>>) -> Self {
        Self { group_id, coordinator }
    }

    pub fn job_type(group_id: PlayerGroupId) -> String {
        format!("notify-{group_id}")
    }
}

#[async_trait]
impl<R: NotifyRepository> JobHandler for NotifyGroupHandler<R> {
    async fn handle(&self, job: &Job, ctx: &JobContext) -> Result<()> {
        let payload: NotifyPayload = serde_json::from_value(job.payload.clone())?;
        self.coordinator.notify(self.group_id, &payload.library_path).await?;
        ctx.report_progress(1, Some(1), Some(format!("notified group {}", self.group_id)));
        Ok(())
    }
}

/// §4.J step 4: the periodic (and opportunistically-kicked) update-queue
/// drain.
pub struct UpdateQueueProcessor<R: NotifyRepository> {
    repo: Arc<R>,
    resolver: Arc<dyn BackendResolver>,
    members_by_id: std::sync::RwLock<std::collections::HashMap<fetcharr_model::MediaPlayerId, MediaPlayer>>,
    playing_postpone: chrono::Duration,
    retry_base: chrono::Duration,
    retry_cap: chrono::Duration,
}

impl<R: NotifyRepository> std::fmt::Debug for UpdateQueueProcessor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateQueueProcessor").finish_non_exhaustive()
    }
}

impl<R: NotifyRepository> UpdateQueueProcessor<R> {
    pub fn new(repo: Arc<R>, resolver: Arc<dyn BackendResolver>, playing_postpone: chrono::Duration, retry_base: chrono::Duration, retry_cap: chrono::Duration) -> Self {
        Self {
            repo,
            resolver,
            members_by_id: std::sync::RwLock::new(std::collections::HashMap::new()),
            playing_postpone,
            retry_base,
            retry_cap,
        }
    }

    /// The player rows referenced by queued updates; populated by the
    /// caller (`fetcharr-server`'s wiring) since `notify::` has no DB access
    /// of its own for a plain `MediaPlayerId -> MediaPlayer` lookup.
    pub fn prime_members(&self, members: impl IntoIterator<Item = MediaPlayer>) {
        let mut guard = self.members_by_id.write().unwrap();
        guard.clear();
        guard.extend(members.into_iter().map(|m| (m.id, m)));
    }

    pub async fn process_once(&self) -> Result<usize> {
        let now = chrono::Utc::now();
        let due = self.repo.due_updates(now).await?;
        let mut processed = 0;

        for mut update in due {
            let Some(player) = self.members_by_id.read().unwrap().get(&update.player_id).cloned() else {
                warn!(player_id = %update.player_id, "no known player for queued update, skipping");
                continue;
            };

            let backend = self.resolver.resolve(&player);
            let playback = backend.probe_playback_state().await.unwrap_or(PlaybackState::Unknown);

            if matches!(playback, PlaybackState::Playing) && matches!(update.update_type, UpdateType::Scan) {
                update.defer(now + self.playing_postpone);
                self.repo.save_update(&update).await?;
                processed += 1;
                continue;
            }

            update.start_executing();
            match backend.notify_library_changed(&update.library_path).await {
                Ok(()) => update.complete(),
                Err(err) => update.fail(err.to_string(), self.retry_base, self.retry_cap),
            }
            self.repo.save_update(&update).await?;
            processed += 1;
        }

        Ok(processed)
    }

    /// Runs `process_once` on a fixed interval, for the scheduler to drive
    /// as a long-lived task rather than a one-shot job.
    pub async fn run_periodic(self: Arc<Self>, interval: std::time::Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(err) = self.process_once().await {
                warn!(error = %err, "update queue processor tick failed");
            }
        }
    }

    /// §4.J step 4's opportunistic kick: drains the queue immediately on a
    /// `PlaybackStopped` event rather than waiting for the next periodic tick.
    pub async fn run_opportunistic(self: Arc<Self>, events: Arc<EventBus>) {
        let mut rx = events.subscribe();
        while let Ok(event) = rx.recv().await {
            if let Event::PlaybackStopped { player_id } = event {
                info!(%player_id, "playback stopped, draining update queue opportunistically");
                if let Err(err) = self.process_once().await {
                    warn!(error = %err, "opportunistic update queue drain failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetcharr_model::{PlayerBackendKind, PlayerGroupId};
    use std::sync::Mutex;

    fn member(group: PlayerGroupId) -> MediaPlayer {
        MediaPlayer::new(group, "kodi-1", PlayerBackendKind::Kodi, "http://kodi.local:8080")
    }

    #[test]
    fn job_type_embeds_the_group_id() {
        let group = PlayerGroupId::new();
        assert_eq!(NotifyGroupHandler::<FakeRepo>::job_type(group), format!("notify-{group}"));
    }

    #[derive(Default)]
    struct FakeRepo {
        groups: Mutex<std::collections::HashMap<PlayerGroupId, (PlayerGroup, Vec<MediaPlayer>)>>,
        enqueued: Mutex<Vec<PlayerUpdate>>,
    }

    #[async_trait]
    impl NotifyRepository for FakeRepo {
        async fn group(&self, id: PlayerGroupId) -> Result<Option<PlayerGroup>> {
            Ok(self.groups.lock().unwrap().get(&id).map(|(g, _)| g.clone()))
        }
        async fn enabled_members(&self, group_id: PlayerGroupId) -> Result<Vec<MediaPlayer>> {
            Ok(self.groups.lock().unwrap().get(&group_id).map(|(_, m)| m.clone()).unwrap_or_default())
        }
        async fn enqueue_update(&self, update: &PlayerUpdate) -> Result<()> {
            self.enqueued.lock().unwrap().push(update.clone());
            Ok(())
        }
        async fn due_updates(&self, _now: chrono::DateTime<chrono::Utc>) -> Result<Vec<PlayerUpdate>> {
            Ok(Vec::new())
        }
        async fn save_update(&self, _update: &PlayerUpdate) -> Result<()> {
            Ok(())
        }
    }

    struct AlwaysIdleResolver;
    impl BackendResolver for AlwaysIdleResolver {
        fn resolve(&self, player: &MediaPlayer) -> Arc<dyn PlayerBackend> {
            backends::build(player, reqwest::Client::new(), None)
        }
    }

    #[tokio::test]
    async fn unknown_group_notify_is_not_found() {
        let repo = Arc::new(FakeRepo::default());
        let coordinator = GroupCoordinator::new(repo, Arc::new(AlwaysIdleResolver), 3);
        let result = coordinator.notify(PlayerGroupId::new(), "/data/Movie").await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn singleton_group_with_no_members_is_a_no_op() {
        let group_id = PlayerGroupId::new();
        let repo = Arc::new(FakeRepo::default());
        repo.groups.lock().unwrap().insert(group_id, (PlayerGroup::new("g", Some(1)), Vec::new()));
        let coordinator = GroupCoordinator::new(repo, Arc::new(AlwaysIdleResolver), 3);
        assert!(coordinator.notify(group_id, "/data/Movie").await.is_ok());
    }

    #[test]
    fn member_constructs_with_expected_backend() {
        let player = member(PlayerGroupId::new());
        assert_eq!(player.backend, PlayerBackendKind::Kodi);
    }
}
