//! §4.F multi-phase scan pipeline. A `library-scan` job drives Discovery;
//! each directory it finds becomes a `directory-scan` child that does the
//! classify/NFO/probe/cache work and, once every sibling has finished,
//! fans out one `enrich-metadata` job per newly-identified item.
//! `download-asset` jobs (emitted by enrichment once scoring selects a
//! candidate) close the loop by pulling bytes into the cache.
//!
//! Grounded on `scan_teacher_ref/orchestration/` for the job-per-phase
//! shape and on `scanner.rs`/`streaming_scanner.rs` for walking a library
//! root with `walkdir` and classifying files as it goes.

pub mod classify;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use fetcharr_config::ScoringConfig;
use fetcharr_model::{
    AssetCandidate, AssetCandidateId, AssetType, AutomationMode, EntityType, IdentificationStatus,
    Job, JobId, Library, LibraryId, MediaItem, MediaItemId, MediaKind, ProviderId,
    ProviderStrategy, UnknownFile,
};

use crate::cache::CacheStore;
use crate::error::{CoreError, Result};
use crate::nfo;
use crate::phash::PerceptualHash;
use crate::probe::StreamProber;
use crate::providers::{OrchestrationStrategy, Orchestrator, ProviderRegistry};
use crate::queue::{JobContext, JobHandler, JobRepository};
use crate::scoring;

use classify::FileKind;

/// Persistence surface the scan handlers need from `db::`, kept separate
/// from [`crate::queue::JobRepository`] (which only knows about `Job` rows)
/// and from [`crate::cache::store::CacheRepository`] (which only knows
/// about cache entries).
#[async_trait]
pub trait ScanRepository: Send + Sync {
    async fn library(&self, id: LibraryId) -> Result<Option<Library>>;
    async fn media_item(&self, id: MediaItemId) -> Result<Option<MediaItem>>;
    async fn find_media_item_by_path(&self, library_id: LibraryId, path: &str) -> Result<Option<MediaItem>>;
    async fn upsert_media_item(&self, item: &MediaItem) -> Result<MediaItemId>;
    async fn insert_unknown_file(&self, file: &UnknownFile) -> Result<()>;
    /// §4.E: full replacement of any prior probe for this `(media_item_id,
    /// file_path)` key, never a merge.
    async fn upsert_stream_probe(&self, probe: &fetcharr_model::StreamProbe) -> Result<()>;
    async fn insert_candidates(&self, candidates: &[AssetCandidate]) -> Result<()>;
    async fn candidates_for(&self, media_item_id: MediaItemId, asset_type: AssetType) -> Result<Vec<AssetCandidate>>;
    async fn update_candidate(&self, candidate: &AssetCandidate) -> Result<()>;
    async fn candidate(&self, id: AssetCandidateId) -> Result<Option<AssetCandidate>>;
    /// Items in `library_id` that finished Phase 2 identified this run and
    /// have not yet had an `enrich-metadata` job queued for them.
    async fn items_awaiting_enrichment(&self, library_id: LibraryId) -> Result<Vec<MediaItem>>;
    /// §3 `RejectedAsset`: the global `(provider, provider_url)` blacklist
    /// the scoring engine's step 1 filter consults.
    async fn globally_rejected_assets(&self) -> Result<BTreeSet<(ProviderId, String)>>;
}

/// §4.F phase counters, read from and written back onto a job's
/// `progress.detail` column. The library-scan job's own row is never
/// re-read mid-run (the queue persists it once the job transitions to a
/// terminal state, which would stomp an interim write); instead every
/// `directory-scan` child carries `directories_total` in its own payload
/// and folds its result into the *parent's* counters, which only that
/// child's sibling writes ever touch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScanCounters {
    pub directories_total: i64,
    pub directories_queued: i64,
    pub directories_scanned: i64,
    pub assets_cached: i64,
}

impl ScanCounters {
    fn from_job(job: &Job) -> Self {
        job.progress.detail.as_ref().and_then(|v| serde_json::from_value(v.clone()).ok()).unwrap_or_default()
    }

    fn write_into(self, job: &mut Job) {
        job.progress.detail = Some(serde_json::to_value(self).unwrap_or(Value::Null));
        job.progress.current = self.directories_scanned;
        job.progress.total = self.directories_total;
    }

    fn phase_2_complete(&self) -> bool {
        self.directories_total > 0 && self.directories_scanned >= self.directories_total
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LibraryScanPayload {
    library_id: LibraryId,
}

#[derive(Debug, Serialize, Deserialize)]
struct DirectoryScanPayload {
    library_id: LibraryId,
    directory: String,
    directories_total: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct EnrichMetadataPayload {
    media_item_id: MediaItemId,
}

#[derive(Debug, Serialize, Deserialize)]
struct DownloadAssetPayload {
    candidate_id: AssetCandidateId,
}

fn parse_payload<T: serde::de::DeserializeOwned>(job: &Job) -> Result<T> {
    serde_json::from_value(job.payload.clone()).map_err(|e| CoreError::Validation(format!("malformed job payload: {e}")))
}

fn entity_type_for(kind: MediaKind) -> EntityType {
    match kind {
        MediaKind::Movie => EntityType::Movie,
        MediaKind::Tv => EntityType::Series,
        MediaKind::Music => EntityType::Album,
    }
}

/// Priority levels from the §4.L table, named here so handlers never spell
/// out a bare integer.
mod priority {
    pub const AUTO_SCAN: i16 = 6;
    pub const AUTO_ENRICHMENT: i16 = 7;
    pub const AUTO_DOWNLOAD: i16 = 7;
    pub const AUTO_PUBLISH: i16 = 7;
}

/// Phase 1: walk the library root, emit one `directory-scan` child per
/// candidate media directory. Non-blocking — completes as soon as children
/// are queued, not when they finish.
pub struct LibraryScanHandler<S: ScanRepository> {
    scan_repo: Arc<S>,
    jobs: Arc<dyn JobRepository>,
}

impl<S: ScanRepository> LibraryScanHandler<S> {
    pub fn new(scan_repo: Arc<S>, jobs: Arc<dyn JobRepository>) -> Self {
        Self { scan_repo, jobs }
    }
}

impl<S: ScanRepository> std::fmt::Debug for LibraryScanHandler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryScanHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<S: ScanRepository> JobHandler for LibraryScanHandler<S> {
    async fn handle(&self, job: &Job, ctx: &JobContext) -> Result<()> {
        let payload: LibraryScanPayload = parse_payload(job)?;
        let library = self
            .scan_repo
            .library(payload.library_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("library {}", payload.library_id)))?;

        let directories = discover_media_directories(Path::new(&library.root_path))?;
        info!(library = %library.name, count = directories.len(), "discovered candidate media directories");

        for directory in &directories {
            let Some(directory_str) = directory.to_str() else {
                warn!(path = ?directory, "skipping non-utf8 directory path");
                continue;
            };
            let child = Job::new(
                "directory-scan",
                priority::AUTO_SCAN,
                serde_json::to_value(DirectoryScanPayload {
                    library_id: library.id,
                    directory: directory_str.to_string(),
                    directories_total: directories.len() as i64,
                })?,
            )
            .child_of(job.id);
            self.jobs.insert(&child).await?;
        }

        ctx.report_progress(directories.len() as u64, Some(directories.len() as u64), Some("directories queued".to_string()));
        Ok(())
    }
}

/// Lists immediate subdirectories of `root` that contain at least one
/// classifiable media file. Grounded on the teacher's `scanner.rs`, which
/// walks with `walkdir::WalkDir` and filters by extension the same way;
/// generalized here to stop at the first directory level holding files
/// rather than descending into every leaf.
fn discover_media_directories(root: &Path) -> Result<Vec<PathBuf>> {
    let mut directories = Vec::new();
    for entry in walkdir::WalkDir::new(root).min_depth(1).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_dir() {
            continue;
        }
        let has_media = std::fs::read_dir(entry.path())
            .into_iter()
            .flatten()
            .filter_map(|e| e.ok())
            .any(|e| e.file_type().is_ok_and(|t| t.is_file()) && classify::classify(&e.path()) != FileKind::Unknown);
        if has_media {
            directories.push(entry.path().to_path_buf());
        }
    }
    Ok(directories)
}

/// Phase 2 (plus inline Phase 3): classify every file in one directory,
/// parse an NFO if present, stream-probe the primary video, cache local
/// artwork, and upsert the `MediaItem`. On the last sibling to finish,
/// fans out `enrich-metadata` jobs for everything this run identified.
pub struct DirectoryScanHandler<S: ScanRepository> {
    scan_repo: Arc<S>,
    jobs: Arc<dyn JobRepository>,
    cache: Arc<CacheStore>,
    prober: StreamProber,
}

impl<S: ScanRepository> DirectoryScanHandler<S> {
    pub fn new(scan_repo: Arc<S>, jobs: Arc<dyn JobRepository>, cache: Arc<CacheStore>) -> Self {
        Self { scan_repo, jobs, cache, prober: StreamProber::new() }
    }
}

impl<S: ScanRepository> std::fmt::Debug for DirectoryScanHandler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryScanHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<S: ScanRepository> JobHandler for DirectoryScanHandler<S> {
    async fn handle(&self, job: &Job, ctx: &JobContext) -> Result<()> {
        let payload: DirectoryScanPayload = parse_payload(job)?;
        let directory = PathBuf::from(&payload.directory);
        let library = self
            .scan_repo
            .library(payload.library_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("library {}", payload.library_id)))?;

        let mut entries: Vec<PathBuf> = std::fs::read_dir(&directory)?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .map(|e| e.path())
            .collect();
        entries.sort();

        let mut primary_video: Option<PathBuf> = None;
        let mut nfo_doc: Option<nfo::NfoDocument> = None;
        let mut image_paths: Vec<PathBuf> = Vec::new();
        let mut unknown_paths: Vec<PathBuf> = Vec::new();

        for path in &entries {
            match classify::classify(path) {
                FileKind::Video => {
                    if primary_video.is_none() {
                        primary_video = Some(path.clone());
                    }
                }
                FileKind::Nfo => match tokio::fs::read_to_string(path).await {
                    Ok(xml) => match nfo::parse(&xml) {
                        Ok(doc) => nfo_doc = Some(doc),
                        Err(err) => warn!(path = ?path, error = %err, "failed to parse nfo, ignoring"),
                    },
                    Err(err) => warn!(path = ?path, error = %err, "failed to read nfo"),
                },
                FileKind::Image => image_paths.push(path.clone()),
                FileKind::Subtitle | FileKind::Trailer => {}
                FileKind::Unknown => unknown_paths.push(path.clone()),
            }
        }

        let title = directory
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("Unknown")
            .to_string();
        let path_str = directory.to_string_lossy().to_string();

        let mut item = match self.scan_repo.find_media_item_by_path(library.id, &path_str).await? {
            Some(existing) => existing,
            None => MediaItem::new(library.id, entity_type_for(library.kind), title, path_str.clone()),
        };

        if let Some(doc) = &nfo_doc {
            item.title = doc.title.clone();
            item.year = doc.year;
            item.metadata.plot = doc.plot.clone();
            item.metadata.tagline = doc.tagline.clone();
            item.metadata.runtime_minutes = doc.runtime;
            item.metadata.rating = doc.rating;
            if !doc.genres.is_empty() {
                item.metadata.genres = doc.genres.clone();
            }
            if !doc.studios.is_empty() {
                item.metadata.studios = doc.studios.clone();
            }
            if !doc.actors.is_empty() {
                item.metadata.actors = doc.actors.clone();
            }
            let ids = doc.provider_ids();
            item.provider_ids.tmdb = item.provider_ids.tmdb.take().or(ids.tmdb);
            item.provider_ids.tvdb = item.provider_ids.tvdb.take().or(ids.tvdb);
            item.provider_ids.imdb = item.provider_ids.imdb.take().or(ids.imdb);
            item.provider_ids.musicbrainz = item.provider_ids.musicbrainz.take().or(ids.musicbrainz);
        }

        if let Some(video_path) = &primary_video {
            match self.prober.probe(item.id, video_path).await {
                Ok(probe) => self.scan_repo.upsert_stream_probe(&probe).await?,
                Err(err) => warn!(path = ?video_path, error = %err, "stream probe failed, continuing without it"),
            }
        }

        let mut cached = 0i64;
        for image_path in &image_paths {
            match tokio::fs::read(image_path).await {
                Ok(bytes) => match cache_local_image(&self.cache, image_path, &bytes).await {
                    Ok(()) => cached += 1,
                    Err(err) => warn!(path = ?image_path, error = %err, "failed to cache local artwork"),
                },
                Err(err) => warn!(path = ?image_path, error = %err, "failed to read local artwork"),
            }
        }

        for path in &unknown_paths {
            let unknown = UnknownFile::new(item.id, path.to_string_lossy().to_string());
            self.scan_repo.insert_unknown_file(&unknown).await?;
        }

        item.mark_identified_if_eligible();
        self.scan_repo.upsert_media_item(&item).await?;

        ctx.report_progress(1, None, Some(format!("scanned {path_str}")));

        if let Some(mut parent) = self.fetch_parent(job).await? {
            let mut counters = ScanCounters::from_job(&parent);
            counters.directories_total = payload.directories_total;
            counters.directories_scanned += 1;
            counters.assets_cached += cached;
            let phase_done = counters.phase_2_complete();
            counters.write_into(&mut parent);
            self.jobs.update(&parent).await?;

            if phase_done {
                self.fan_out_enrichment(library.id, parent.id).await?;
            }
        }

        Ok(())
    }
}

impl<S: ScanRepository> DirectoryScanHandler<S> {
    async fn fetch_parent(&self, job: &Job) -> Result<Option<Job>> {
        match job.parent_job_id {
            Some(parent_id) => self.jobs.fetch(parent_id).await,
            None => Ok(None),
        }
    }

    async fn fan_out_enrichment(&self, library_id: LibraryId, parent_job_id: JobId) -> Result<()> {
        let items = self.scan_repo.items_awaiting_enrichment(library_id).await?;
        for item in items {
            let child = Job::new(
                "enrich-metadata",
                priority::AUTO_ENRICHMENT,
                serde_json::to_value(EnrichMetadataPayload { media_item_id: item.id })?,
            )
            .child_of(parent_job_id);
            self.jobs.insert(&child).await?;
        }
        Ok(())
    }
}

async fn cache_local_image(cache: &CacheStore, path: &Path, bytes: &[u8]) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("jpg");
    let mime = match ext {
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "image/jpeg",
    };
    let (width, height, phash) = match image::load_from_memory(bytes) {
        Ok(image) => {
            let (w, h) = (image.width() as i32, image.height() as i32);
            (Some(w), Some(h), Some(scoring::phash_for_image(&image).0 as i64))
        }
        Err(_) => (None, None, None),
    };
    cache.store(bytes, ext, mime, width, height, phash).await?;
    Ok(())
}

/// Phase 4: fan a single item's enrichment out across enabled providers,
/// merge through the field-lock arbiter, persist candidates, and — unless
/// automation is manual — score and select, queuing downloads for anything
/// newly selected.
pub struct EnrichMetadataHandler<S: ScanRepository> {
    scan_repo: Arc<S>,
    jobs: Arc<dyn JobRepository>,
    registry: Arc<ProviderRegistry>,
    scoring_config: ScoringConfig,
}

impl<S: ScanRepository> EnrichMetadataHandler<S> {
    pub fn new(scan_repo: Arc<S>, jobs: Arc<dyn JobRepository>, registry: Arc<ProviderRegistry>, scoring_config: ScoringConfig) -> Self {
        Self { scan_repo, jobs, registry, scoring_config }
    }
}

impl<S: ScanRepository> std::fmt::Debug for EnrichMetadataHandler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichMetadataHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<S: ScanRepository> JobHandler for EnrichMetadataHandler<S> {
    async fn handle(&self, job: &Job, _ctx: &JobContext) -> Result<()> {
        let payload: EnrichMetadataPayload = parse_payload(job)?;
        let mut item = self
            .scan_repo
            .media_item(payload.media_item_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("media item {}", payload.media_item_id)))?;
        let library = self
            .scan_repo
            .library(item.library_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("library {}", item.library_id)))?;

        let orchestrator = Orchestrator::new(&self.registry);
        let strategy = map_strategy(library.strategy);
        let search_ids = search_ids_for(&item);

        let result = orchestrator
            .enrich(&item, item.entity_type, &library.provider_priority, strategy, &search_ids)
            .await;

        for (name, value) in &result.fields {
            apply_field(&mut item, name, value);
        }

        let mut candidates: Vec<AssetCandidate> = result
            .assets
            .iter()
            .filter(|(_, asset)| !item.is_asset_locked(asset.asset_type))
            .map(|(provider, asset)| {
                let mut candidate = AssetCandidate::new(item.id, asset.asset_type, *provider, asset.source_url.clone());
                candidate.width = asset.width;
                candidate.height = asset.height;
                candidate.language = asset.language.clone();
                candidate.vote_count = asset.vote_count;
                candidate.vote_average = asset.vote_average;
                candidate
            })
            .collect();

        if !candidates.is_empty() {
            self.scan_repo.insert_candidates(&candidates).await?;
        }

        if !matches!(library.automation_mode, AutomationMode::Manual) {
            let mut asset_types: Vec<AssetType> = candidates.iter().map(|c| c.asset_type).collect();
            asset_types.sort();
            asset_types.dedup();
            let globally_rejected = self.scan_repo.globally_rejected_assets().await?;

            for asset_type in asset_types {
                let mut pool = self.scan_repo.candidates_for(item.id, asset_type).await?;
                let hashes: Vec<Option<PerceptualHash>> = vec![None; pool.len()];
                scoring::run(
                    &mut pool,
                    &hashes,
                    asset_type,
                    &self.scoring_config,
                    &library.preferred_language,
                    &library.provider_priority,
                    library.automation_mode,
                    &globally_rejected,
                );

                for candidate in &pool {
                    self.scan_repo.update_candidate(candidate).await?;
                    if candidate.is_selected && !candidate.is_downloaded {
                        let child = Job::new(
                            "download-asset",
                            priority::AUTO_DOWNLOAD,
                            serde_json::to_value(DownloadAssetPayload { candidate_id: candidate.id })?,
                        )
                        .child_of(job.id);
                        self.jobs.insert(&child).await?;
                    }
                }
            }
            candidates = Vec::new();
        }
        let _ = candidates;

        if matches!(library.automation_mode, AutomationMode::Yolo) {
            let publish = Job::new("publish", priority::AUTO_PUBLISH, serde_json::json!({ "media_item_id": item.id })).child_of(job.id);
            self.jobs.insert(&publish).await?;
        }

        item.identification_status = IdentificationStatus::Enriched;
        item.has_unpublished_changes = true;
        self.scan_repo.upsert_media_item(&item).await?;

        Ok(())
    }
}

fn map_strategy(strategy: ProviderStrategy) -> OrchestrationStrategy {
    match strategy {
        ProviderStrategy::PreferredFirstFillGaps => OrchestrationStrategy::PreferredFirstFillGaps,
        ProviderStrategy::FieldMapping => OrchestrationStrategy::FieldMapping("default"),
        ProviderStrategy::AggregateAll => OrchestrationStrategy::AggregateAll,
    }
}

fn search_ids_for(item: &MediaItem) -> BTreeMap<ProviderId, String> {
    let mut ids = BTreeMap::new();
    if let Some(tmdb) = &item.provider_ids.tmdb {
        ids.insert(ProviderId::Tmdb, tmdb.clone());
        ids.insert(ProviderId::FanartTv, tmdb.clone());
    }
    if let Some(tvdb) = &item.provider_ids.tvdb {
        ids.insert(ProviderId::Tvdb, tvdb.clone());
    }
    if let Some(mb) = &item.provider_ids.musicbrainz {
        ids.insert(ProviderId::MusicBrainz, mb.clone());
    }
    ids
}

fn apply_field(item: &mut MediaItem, name: &str, value: &Value) {
    match name {
        "title" => {
            if let Some(v) = value.as_str() {
                item.title = v.to_string();
            }
        }
        "year" => item.year = value.as_i64().map(|v| v as i32),
        "plot" => item.metadata.plot = value.as_str().map(str::to_string),
        "tagline" => item.metadata.tagline = value.as_str().map(str::to_string),
        "runtime" => item.metadata.runtime_minutes = value.as_i64().map(|v| v as i32),
        "rating" => item.metadata.rating = value.as_f64(),
        "actors" => {
            if let Some(v) = value.as_array() {
                item.metadata.actors = v.iter().filter_map(|e| e.as_str().map(str::to_string)).collect();
            }
        }
        "genres" => {
            if let Some(v) = value.as_array() {
                item.metadata.genres = v.iter().filter_map(|e| e.as_str().map(str::to_string)).collect();
            }
        }
        "studios" => {
            if let Some(v) = value.as_array() {
                item.metadata.studios = v.iter().filter_map(|e| e.as_str().map(str::to_string)).collect();
            }
        }
        _ => {}
    }
}

/// Pulls a selected-but-not-yet-downloaded candidate's bytes into the
/// content-addressed cache and marks it downloaded.
pub struct DownloadAssetHandler<S: ScanRepository> {
    scan_repo: Arc<S>,
    cache: Arc<CacheStore>,
    http: reqwest::Client,
}

impl<S: ScanRepository> DownloadAssetHandler<S> {
    pub fn new(scan_repo: Arc<S>, cache: Arc<CacheStore>, http: reqwest::Client) -> Self {
        Self { scan_repo, cache, http }
    }
}

impl<S: ScanRepository> std::fmt::Debug for DownloadAssetHandler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadAssetHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<S: ScanRepository> JobHandler for DownloadAssetHandler<S> {
    async fn handle(&self, job: &Job, _ctx: &JobContext) -> Result<()> {
        let payload: DownloadAssetPayload = parse_payload(job)?;
        let mut candidate = self
            .scan_repo
            .candidate(payload.candidate_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("asset candidate {}", payload.candidate_id)))?;

        let response = self
            .http
            .get(&candidate.source_url)
            .send()
            .await
            .map_err(|e| CoreError::Transient(format!("download failed: {e}")))?;
        if !response.status().is_success() {
            return Err(CoreError::Transient(format!("download returned status {}", response.status())));
        }
        let bytes = response.bytes().await.map_err(|e| CoreError::Transient(format!("download body read failed: {e}")))?;

        let ext = extension_for(&candidate.asset_type, &candidate.source_url);
        let mime = mime_for(ext);
        let (phash, width, height) = match candidate.asset_type {
            AssetType::Subtitle | AssetType::Trailer => (None, None, None),
            _ => match image::load_from_memory(&bytes) {
                Ok(image) => (Some(scoring::phash_for_image(&image).0 as i64), Some(image.width() as i32), Some(image.height() as i32)),
                Err(_) => (None, None, None),
            },
        };

        let stored = self.cache.store(&bytes, ext, mime, width, height, phash).await?;
        candidate.width = width.or(candidate.width);
        candidate.height = height.or(candidate.height);
        candidate.mark_downloaded(stored.content_hash, phash);
        self.scan_repo.update_candidate(&candidate).await?;

        Ok(())
    }
}

fn extension_for(asset_type: &AssetType, url: &str) -> &'static str {
    if matches!(asset_type, AssetType::Subtitle) {
        return "srt";
    }
    if matches!(asset_type, AssetType::Trailer) {
        return "mp4";
    }
    match url.rsplit('.').next() {
        Some("png") => "png",
        Some("webp") => "webp",
        _ => "jpg",
    }
}

fn mime_for(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "srt" => "application/x-subrip",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_detect_phase_2_completion_only_once_total_is_known() {
        let mut job = Job::new("library-scan", priority::AUTO_SCAN, serde_json::json!({}));
        let mut counters = ScanCounters { directories_total: 0, directories_queued: 0, directories_scanned: 0, assets_cached: 0 };
        assert!(!counters.phase_2_complete());

        counters.directories_total = 2;
        counters.directories_scanned = 1;
        counters.write_into(&mut job);
        assert!(!ScanCounters::from_job(&job).phase_2_complete());

        counters.directories_scanned = 2;
        counters.write_into(&mut job);
        assert!(ScanCounters::from_job(&job).phase_2_complete());
    }

    #[test]
    fn apply_field_ignores_unknown_field_names() {
        let mut item = MediaItem::new(LibraryId::new(), EntityType::Movie, "Before", "/x");
        apply_field(&mut item, "not_a_real_field", &Value::from("whatever"));
        assert_eq!(item.title, "Before");

        apply_field(&mut item, "title", &Value::from("After"));
        assert_eq!(item.title, "After");
    }

    #[test]
    fn search_ids_map_fanart_to_the_tmdb_id() {
        let mut item = MediaItem::new(LibraryId::new(), EntityType::Movie, "X", "/x");
        item.provider_ids.tmdb = Some("603".to_string());
        let ids = search_ids_for(&item);
        assert_eq!(ids.get(&ProviderId::FanartTv), Some(&"603".to_string()));
    }
}
