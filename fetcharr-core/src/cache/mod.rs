//! §4.A content-addressed asset cache.
//!
//! Blobs are keyed by SHA-256 of their bytes and fanned out under
//! `{root}/{h[0:2]}/{h[2:4]}/{hash}.{ext}` (see
//! [`fetcharr_model::CacheEntry::relative_path_for`]). Writes land in a temp
//! file in the same directory and are renamed into place, so a reader never
//! observes a partially-written blob. Reference counting and GC live here
//! rather than in `db/`: both need the filesystem and the `cache_entries`
//! table in the same transaction-shaped operation.

mod gc;
mod store;

pub use gc::GarbageCollector;
pub use store::{CacheRepository, CacheStore, StoreResult};
