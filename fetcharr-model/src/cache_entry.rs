use serde::{Deserialize, Serialize};

/// §3/§4.A `CacheEntry`: a content-addressed blob keyed by the SHA-256 of
/// its bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CacheEntry {
    /// Hex-encoded SHA-256 of the blob's bytes; the primary key.
    pub content_hash: String,
    /// Path relative to the cache root: `{h[0:2]}/{h[2:4]}/{hash}.{ext}`.
    pub relative_path: String,
    pub byte_size: i64,
    pub mime_type: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub perceptual_hash: Option<i64>,
    pub reference_count: i32,
    pub orphaned_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_used_at: chrono::DateTime<chrono::Utc>,
}

impl CacheEntry {
    pub fn new(
        content_hash: String,
        relative_path: String,
        byte_size: i64,
        mime_type: String,
        width: Option<i32>,
        height: Option<i32>,
        perceptual_hash: Option<i64>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            content_hash,
            relative_path,
            byte_size,
            mime_type,
            width,
            height,
            perceptual_hash,
            reference_count: 1,
            orphaned_at: None,
            created_at: now,
            last_used_at: now,
        }
    }

    pub fn relative_path_for(content_hash: &str, extension: &str) -> String {
        let (a, rest) = content_hash.split_at(2.min(content_hash.len()));
        let (b, _) = rest.split_at(2.min(rest.len()));
        format!("{a}/{b}/{content_hash}.{extension}")
    }

    /// §8 invariant 2: `orphaned_at` is set iff `reference_count = 0`.
    pub fn is_consistent(&self) -> bool {
        self.orphaned_at.is_some() == (self.reference_count == 0)
    }

    /// §4.A: eligible for physical deletion once orphaned longer than `grace`.
    pub fn is_eligible_for_gc(&self, grace: chrono::Duration, now: chrono::DateTime<chrono::Utc>) -> bool {
        match self.orphaned_at {
            Some(orphaned_at) => now - orphaned_at >= grace,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_fans_out_by_first_four_hex_chars() {
        let path = CacheEntry::relative_path_for("abcd1234ef", "jpg");
        assert_eq!(path, "ab/cd/abcd1234ef.jpg");
    }

    #[test]
    fn gc_eligibility_respects_grace_window() {
        let now = chrono::Utc::now();
        let entry = CacheEntry {
            content_hash: "abc".into(),
            relative_path: "ab/c/abc.jpg".into(),
            byte_size: 10,
            mime_type: "image/jpeg".into(),
            width: None,
            height: None,
            perceptual_hash: None,
            reference_count: 0,
            orphaned_at: Some(now - chrono::Duration::days(89)),
            created_at: now,
            last_used_at: now,
        };
        let grace = chrono::Duration::days(90);
        assert!(!entry.is_eligible_for_gc(grace, now));
        assert!(entry.is_eligible_for_gc(grace, now + chrono::Duration::days(2)));
    }
}
