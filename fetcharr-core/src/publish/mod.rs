//! §4.H publish engine: renders the current DB state of a [`MediaItem`] into
//! its library directory as an NFO plus the selected assets, then hands off
//! to §4.J notification. Grounded on `scan::DirectoryScanHandler`'s
//! `JobHandler` shape for the transactional-write-then-record pattern, and
//! on `cache::CacheStore` for the content-addressed source of every asset
//! byte stream.

mod naming;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use fetcharr_config::CompletenessConfig;
use fetcharr_model::{
    AssetCandidate, Job, Library, MediaItem, MediaItemId, PathMapping, PlayerGroupId,
    PublishLogEntry, PublishedAsset, PublishedAssetId,
};

use crate::cache::CacheStore;
use crate::error::{CoreError, Result};
use crate::nfo::{self, NfoDocument};
use crate::pathmap;
use crate::queue::{JobContext, JobHandler, JobRepository};

/// Persistence surface `publish::` needs, implemented against Postgres in
/// `crate::db`.
#[async_trait]
pub trait PublishRepository: Send + Sync {
    async fn media_item(&self, id: MediaItemId) -> Result<Option<MediaItem>>;
    async fn library(&self, id: fetcharr_model::LibraryId) -> Result<Option<Library>>;
    async fn selected_candidates(&self, media_item_id: MediaItemId) -> Result<Vec<AssetCandidate>>;
    async fn published_assets_for(&self, media_item_id: MediaItemId) -> Result<Vec<PublishedAsset>>;
    async fn upsert_published_asset(&self, asset: &PublishedAsset) -> Result<()>;
    async fn delete_published_asset(&self, id: PublishedAssetId) -> Result<()>;
    async fn insert_publish_log(&self, entry: &PublishLogEntry) -> Result<()>;
    async fn clear_unpublished_flag(&self, media_item_id: MediaItemId) -> Result<()>;
    /// Every enabled player group and the path mappings scoped to it,
    /// consulted to decide which `notify-<group>` jobs a publish should
    /// fan out to.
    async fn enabled_player_groups(&self) -> Result<Vec<(PlayerGroupId, Vec<PathMapping>)>>;
}

#[derive(serde::Deserialize)]
struct PublishPayload {
    media_item_id: MediaItemId,
}

mod priority {
    pub const NOTIFY: i16 = 5;
}

/// One file written during a publish attempt, kept so a mid-publish failure
/// can be rolled back.
struct WrittenFile {
    path: PathBuf,
    pre_existing: bool,
}

pub struct PublishHandler<P: PublishRepository> {
    repo: Arc<P>,
    cache: Arc<CacheStore>,
    jobs: Arc<dyn JobRepository>,
    completeness: CompletenessConfig,
    concurrency: Arc<tokio::sync::Semaphore>,
}

impl<P: PublishRepository> std::fmt::Debug for PublishHandler<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishHandler").finish_non_exhaustive()
    }
}

impl<P: PublishRepository> PublishHandler<P> {
    pub fn new(
        repo: Arc<P>,
        cache: Arc<CacheStore>,
        jobs: Arc<dyn JobRepository>,
        completeness: CompletenessConfig,
        max_parallel_publishes: usize,
    ) -> Self {
        Self {
            repo,
            cache,
            jobs,
            completeness,
            concurrency: Arc::new(tokio::sync::Semaphore::new(max_parallel_publishes.max(1))),
        }
    }

    fn required_fields(&self, kind: fetcharr_model::MediaKind) -> &fetcharr_config::RequiredFields {
        match kind {
            fetcharr_model::MediaKind::Movie => &self.completeness.movie,
            fetcharr_model::MediaKind::Tv => &self.completeness.tv,
            fetcharr_model::MediaKind::Music => &self.completeness.music,
        }
    }

    /// §4.H step 1. Returns the first missing field's name as the error
    /// detail so the validation failure is actionable from job history.
    fn validate_completeness(&self, item: &MediaItem, kind: fetcharr_model::MediaKind) -> Result<()> {
        let required = self.required_fields(kind);
        if required.title && item.title.trim().is_empty() {
            return Err(CoreError::Validation(format!("{}: title is required", item.id)));
        }
        if required.year && item.year.is_none() {
            return Err(CoreError::Validation(format!("{}: year is required", item.id)));
        }
        if required.plot && item.metadata.plot.as_deref().unwrap_or("").trim().is_empty() {
            return Err(CoreError::Validation(format!("{}: plot is required", item.id)));
        }
        if required.runtime && item.metadata.runtime_minutes.is_none() {
            return Err(CoreError::Validation(format!("{}: runtime is required", item.id)));
        }
        Ok(())
    }

    /// §4.H step 3: hard-link when the cache blob and the library directory
    /// share a volume, else a streamed copy. `std::fs::hard_link` itself
    /// returns the cross-device error that distinguishes the two cases, so
    /// no `st_dev` comparison is needed up front.
    async fn place_asset(&self, source: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let source_for_link = source.to_path_buf();
        let dest_for_link = dest.to_path_buf();
        let hardlink_result = tokio::task::spawn_blocking(move || std::fs::hard_link(&source_for_link, &dest_for_link))
            .await
            .map_err(|e| CoreError::Internal(format!("hard-link task panicked: {e}")))?;

        match hardlink_result {
            Ok(()) => Ok(()),
            Err(_) => tokio::fs::copy(source, dest).await.map(|_| ()).map_err(CoreError::from),
        }
    }
}

#[async_trait]
impl<P: PublishRepository> JobHandler for PublishHandler<P> {
    async fn handle(&self, job: &Job, ctx: &JobContext) -> Result<()> {
        let _permit = self
            .concurrency
            .acquire()
            .await
            .map_err(|e| CoreError::Internal(format!("publish semaphore closed: {e}")))?;

        let started_at = chrono::Utc::now();
        let payload: PublishPayload = serde_json::from_value(job.payload.clone())?;

        let result = self.publish_one(payload.media_item_id, ctx).await;
        let duration_ms = (chrono::Utc::now() - started_at).num_milliseconds();

        let log = PublishLogEntry {
            id: uuid::Uuid::new_v4(),
            media_item_id: payload.media_item_id,
            success: result.is_ok(),
            duration_ms,
            nfo_hash: result.as_ref().ok().and_then(|r| r.nfo_hash.clone()),
            assets_written: result.as_ref().map(|r| r.assets_written.clone()).unwrap_or_default(),
            error: result.as_ref().err().map(|e| e.to_string()),
            created_at: chrono::Utc::now(),
        };
        self.repo.insert_publish_log(&log).await?;

        result.map(|_| ())
    }
}

struct PublishOutcome {
    nfo_hash: Option<String>,
    assets_written: Vec<String>,
}

impl<P: PublishRepository> PublishHandler<P> {
    async fn publish_one(&self, media_item_id: MediaItemId, ctx: &JobContext) -> Result<PublishOutcome> {
        let item = self
            .repo
            .media_item(media_item_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("media item {media_item_id}")))?;
        let library = self
            .repo
            .library(item.library_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("library {}", item.library_id)))?;

        let candidates = self.repo.selected_candidates(media_item_id).await?;
        for candidate in &candidates {
            if !candidate.is_publish_ready() {
                return Err(CoreError::Validation(format!(
                    "candidate {} selected but not downloaded", candidate.id
                )));
            }
        }
        self.validate_completeness(&item, library.kind)?;

        let doc = NfoDocument::from_media_item(&item);
        let xml = nfo::generate(item.entity_type, &doc)?;

        let previous_assets = self.repo.published_assets_for(media_item_id).await?;
        let mut written: Vec<WrittenFile> = Vec::new();
        let mut new_published: Vec<PublishedAsset> = Vec::new();
        let mut assets_written_names: Vec<String> = Vec::new();

        let publish_result = self
            .write_everything(&item, &candidates, &xml, &mut written, &mut new_published, &mut assets_written_names)
            .await;

        if let Err(err) = publish_result {
            self.rollback(&written, &previous_assets).await;
            return Err(err);
        }

        for asset in &new_published {
            self.repo.upsert_published_asset(asset).await?;
        }
        let stale_ids: Vec<PublishedAssetId> = previous_assets
            .iter()
            .filter(|old| !new_published.iter().any(|new| new.asset_type == old.asset_type))
            .map(|old| old.id)
            .collect();
        for id in stale_ids {
            self.repo.delete_published_asset(id).await?;
        }

        self.repo.clear_unpublished_flag(media_item_id).await?;
        ctx.report_progress(1, Some(1), Some(format!("published {media_item_id}")));

        self.enqueue_notifications(&item).await?;

        Ok(PublishOutcome { nfo_hash: Some(sha256_hex(xml.as_bytes())), assets_written: assets_written_names })
    }

    async fn write_everything(
        &self,
        item: &MediaItem,
        candidates: &[AssetCandidate],
        nfo_xml: &str,
        written: &mut Vec<WrittenFile>,
        new_published: &mut Vec<PublishedAsset>,
        assets_written_names: &mut Vec<String>,
    ) -> Result<()> {
        let item_dir = PathBuf::from(&item.path);

        let mut slot_counters: std::collections::HashMap<fetcharr_model::AssetType, usize> = std::collections::HashMap::new();
        for candidate in candidates {
            let content_hash = candidate
                .content_hash
                .as_deref()
                .ok_or_else(|| CoreError::Integrity(format!("candidate {} selected without a content hash", candidate.id)))?;
            let source = self.cache.absolute_path(content_hash).await?;
            let ext = source.extension().and_then(|e| e.to_str()).unwrap_or("bin");

            let slot = slot_counters.entry(candidate.asset_type).or_insert(0);
            let filename = naming::filename_for(candidate.asset_type, *slot, ext);
            *slot += 1;

            let dest = item_dir.join(&filename);
            let pre_existing = tokio::fs::try_exists(&dest).await?;
            self.place_asset(&source, &dest).await?;
            written.push(WrittenFile { path: dest.clone(), pre_existing });

            new_published.push(PublishedAsset::new(item.id, candidate.asset_type, dest.to_string_lossy().to_string(), content_hash));
            assets_written_names.push(filename);
        }

        let nfo_filename = format!("{}.nfo", nfo::root_tag(item.entity_type));
        let nfo_dest = item_dir.join(&nfo_filename);
        let nfo_pre_existing = tokio::fs::try_exists(&nfo_dest).await?;
        write_nfo_atomic(&nfo_dest, nfo_xml).await?;
        written.push(WrittenFile { path: nfo_dest.clone(), pre_existing: nfo_pre_existing });
        assets_written_names.push(nfo_filename);

        Ok(())
    }

    /// §4.H step 5. Files this attempt created outright are unlinked; files
    /// that overwrote something already on disk are left in place with a
    /// warning, since the previous bytes are gone and a rename-back has
    /// nothing to restore from.
    async fn rollback(&self, written: &[WrittenFile], _previous_assets: &[PublishedAsset]) {
        for file in written.iter().rev() {
            if file.pre_existing {
                warn!(path = %file.path.display(), "publish rollback: leaving overwritten file in place");
                continue;
            }
            if let Err(err) = tokio::fs::remove_file(&file.path).await {
                warn!(path = %file.path.display(), error = %err, "publish rollback: failed to remove partial write");
            }
        }
    }

    async fn enqueue_notifications(&self, item: &MediaItem) -> Result<()> {
        for (group_id, mappings) in self.repo.enabled_player_groups().await? {
            let library_path = pathmap::translate(&item.path, &mappings);
            let job = Job::new(
                format!("notify-{group_id}"),
                priority::NOTIFY,
                serde_json::json!({ "group_id": group_id, "media_item_id": item.id, "library_path": library_path }),
            );
            self.jobs.insert(&job).await?;
        }
        Ok(())
    }
}

pub(crate) async fn write_nfo_atomic(dest: &Path, xml: &str) -> Result<()> {
    let parent = dest.parent().ok_or_else(|| CoreError::Internal("nfo path has no parent".into()))?;
    tokio::fs::create_dir_all(parent).await?;
    let tmp = parent.join(format!(".{}.tmp-{}", dest.file_name().and_then(|n| n.to_str()).unwrap_or("nfo"), std::process::id()));
    tokio::fs::write(&tmp, xml.as_bytes()).await?;
    tokio::fs::rename(&tmp, dest).await?;
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write;
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetcharr_model::EntityType;

    #[test]
    fn sha256_hex_matches_known_vector() {
        assert_eq!(sha256_hex(b""), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85");
    }

    #[test]
    fn nfo_filename_matches_root_tag() {
        assert_eq!(format!("{}.nfo", nfo::root_tag(EntityType::Movie)), "movie.nfo");
        assert_eq!(format!("{}.nfo", nfo::root_tag(EntityType::Series)), "tvshow.nfo");
    }
}
