//! `Store`/`Retrieve`/`AddReference`/`ReleaseReference` (spec §4.A).
//!
//! Grounded on the teacher's `infra/cache/image_store.rs` typed-facade shape,
//! but hand-rolled on `sha2` + `tokio::fs` instead of `cacache`: the spec
//! needs explicit reference counting and an `orphaned_at` transition that
//! `cacache`'s own index format does not expose.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};
use fetcharr_model::CacheEntry;

/// Persistence seam `cache/` needs from `db/`: reading/writing the
/// `cache_entries` row that accompanies every blob. Kept here (rather than
/// in `fetcharr-contracts`) because it is internal to `fetcharr-core`, not a
/// cross-crate boundary.
#[async_trait]
pub trait CacheRepository: Send + Sync {
    async fn find(&self, content_hash: &str) -> Result<Option<CacheEntry>>;
    async fn upsert(&self, entry: &CacheEntry) -> Result<()>;
    async fn increment_reference(&self, content_hash: &str) -> Result<()>;
    /// Decrements the ref-count and, if it reaches zero in the same
    /// transaction, stamps `orphaned_at`. Returns the entry's new state.
    async fn release_reference(&self, content_hash: &str) -> Result<CacheEntry>;
    async fn list_orphaned_before(&self, cutoff: chrono::DateTime<chrono::Utc>) -> Result<Vec<CacheEntry>>;
    async fn delete(&self, content_hash: &str) -> Result<()>;
    async fn restore_orphaned(&self, content_hash: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct StoreResult {
    pub content_hash: String,
    pub relative_path: String,
    pub deduped: bool,
}

/// The on-disk half of the content-addressed cache. `root` is the same
/// directory `CacheConfig::root_path` names.
#[derive(Clone)]
pub struct CacheStore {
    root: PathBuf,
    repo: std::sync::Arc<dyn CacheRepository>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore").field("root", &self.root).finish()
    }
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>, repo: std::sync::Arc<dyn CacheRepository>) -> Self {
        Self { root: root.into(), repo }
    }

    fn absolute(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path)
    }

    /// Insert-once write. Returns `deduped = true` when a row for this hash
    /// already existed (the bytes were already known).
    pub async fn store(
        &self,
        bytes: &[u8],
        ext: &str,
        mime_type: &str,
        width: Option<i32>,
        height: Option<i32>,
        perceptual_hash: Option<i64>,
    ) -> Result<StoreResult> {
        let content_hash = hex_sha256(bytes);

        if let Some(existing) = self.repo.find(&content_hash).await? {
            self.repo.increment_reference(&content_hash).await?;
            if existing.orphaned_at.is_some() {
                self.repo.restore_orphaned(&content_hash).await?;
            }
            return Ok(StoreResult {
                content_hash,
                relative_path: existing.relative_path,
                deduped: true,
            });
        }

        let relative_path = CacheEntry::relative_path_for(&content_hash, ext);
        let absolute = self.absolute(&relative_path);
        if let Some(parent) = absolute.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if tokio::fs::try_exists(&absolute).await? {
            let on_disk = tokio::fs::read(&absolute).await?;
            if hex_sha256(&on_disk) != content_hash {
                return Err(CoreError::Integrity(format!(
                    "existing file at {relative_path} does not match its content hash"
                )));
            }
        } else {
            write_atomic(&absolute, bytes).await?;
        }

        let entry = CacheEntry::new(
            content_hash.clone(),
            relative_path.clone(),
            bytes.len() as i64,
            mime_type.to_string(),
            width,
            height,
            perceptual_hash,
        );
        self.repo.upsert(&entry).await?;

        Ok(StoreResult { content_hash, relative_path, deduped: false })
    }

    pub async fn retrieve(&self, content_hash: &str) -> Result<Vec<u8>> {
        let entry = self
            .repo
            .find(content_hash)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("cache entry {content_hash}")))?;
        let path = self.absolute(&entry.relative_path);
        tokio::fs::read(&path)
            .await
            .map_err(|_| CoreError::NotFound(format!("cache blob missing on disk: {}", path.display())))
    }

    pub async fn absolute_path(&self, content_hash: &str) -> Result<PathBuf> {
        let entry = self
            .repo
            .find(content_hash)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("cache entry {content_hash}")))?;
        Ok(self.absolute(&entry.relative_path))
    }

    pub async fn add_reference(&self, content_hash: &str) -> Result<()> {
        self.repo.increment_reference(content_hash).await
    }

    pub async fn release_reference(&self, content_hash: &str) -> Result<CacheEntry> {
        self.repo.release_reference(content_hash).await
    }
}

fn hex_sha256(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Temp file in the destination directory, then rename — same filesystem
/// guarantees the rename is atomic.
async fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let parent = dest.parent().ok_or_else(|| CoreError::Internal("cache path has no parent".into()))?;
    let tmp_name = format!(".{}.tmp-{}", dest.file_name().and_then(|n| n.to_str()).unwrap_or("blob"), std::process::id());
    let tmp_path = parent.join(tmp_name);
    tokio::fs::write(&tmp_path, bytes).await?;
    tokio::fs::rename(&tmp_path, dest).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryRepo {
        entries: Mutex<std::collections::HashMap<String, CacheEntry>>,
    }

    #[async_trait]
    impl CacheRepository for InMemoryRepo {
        async fn find(&self, content_hash: &str) -> Result<Option<CacheEntry>> {
            Ok(self.entries.lock().unwrap().get(content_hash).cloned())
        }

        async fn upsert(&self, entry: &CacheEntry) -> Result<()> {
            self.entries.lock().unwrap().insert(entry.content_hash.clone(), entry.clone());
            Ok(())
        }

        async fn increment_reference(&self, content_hash: &str) -> Result<()> {
            let mut guard = self.entries.lock().unwrap();
            let entry = guard.get_mut(content_hash).expect("entry present");
            entry.reference_count += 1;
            Ok(())
        }

        async fn release_reference(&self, content_hash: &str) -> Result<CacheEntry> {
            let mut guard = self.entries.lock().unwrap();
            let entry = guard.get_mut(content_hash).expect("entry present");
            entry.reference_count -= 1;
            if entry.reference_count <= 0 {
                entry.orphaned_at = Some(chrono::Utc::now());
            }
            Ok(entry.clone())
        }

        async fn list_orphaned_before(&self, cutoff: chrono::DateTime<chrono::Utc>) -> Result<Vec<CacheEntry>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .values()
                .filter(|e| e.orphaned_at.map(|t| t < cutoff).unwrap_or(false))
                .cloned()
                .collect())
        }

        async fn delete(&self, content_hash: &str) -> Result<()> {
            self.entries.lock().unwrap().remove(content_hash);
            Ok(())
        }

        async fn restore_orphaned(&self, content_hash: &str) -> Result<()> {
            if let Some(entry) = self.entries.lock().unwrap().get_mut(content_hash) {
                entry.orphaned_at = None;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn storing_the_same_bytes_twice_dedupes_and_increments_refcount() {
        let dir = tempfile::tempdir().unwrap();
        let repo = std::sync::Arc::new(InMemoryRepo::default());
        let store = CacheStore::new(dir.path(), repo.clone());

        let first = store.store(b"hello", "jpg", "image/jpeg", Some(100), Some(100), None).await.unwrap();
        assert!(!first.deduped);

        let second = store.store(b"hello", "jpg", "image/jpeg", Some(100), Some(100), None).await.unwrap();
        assert!(second.deduped);
        assert_eq!(first.content_hash, second.content_hash);

        let entry = repo.find(&first.content_hash).await.unwrap().unwrap();
        assert_eq!(entry.reference_count, 2);
    }

    #[tokio::test]
    async fn store_then_retrieve_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let repo = std::sync::Arc::new(InMemoryRepo::default());
        let store = CacheStore::new(dir.path(), repo);

        let result = store.store(b"blob-bytes", "png", "image/png", None, None, None).await.unwrap();
        let bytes = store.retrieve(&result.content_hash).await.unwrap();
        assert_eq!(bytes, b"blob-bytes");
    }

    #[tokio::test]
    async fn releasing_the_last_reference_orphans_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let repo = std::sync::Arc::new(InMemoryRepo::default());
        let store = CacheStore::new(dir.path(), repo);

        let result = store.store(b"data", "jpg", "image/jpeg", None, None, None).await.unwrap();
        let entry = store.release_reference(&result.content_hash).await.unwrap();
        assert!(entry.orphaned_at.is_some());
    }

    #[test]
    fn hex_sha256_matches_known_vector() {
        // sha256("") = e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855
        assert_eq!(
            hex_sha256(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85"
        );
    }
}
