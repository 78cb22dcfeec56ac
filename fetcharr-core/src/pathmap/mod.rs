//! §4.I path translator: pure, longest-prefix-match rewrite of a path
//! between a manager's (or a player group's) filesystem view and this
//! service's own.

use fetcharr_model::PathMapping;

/// Forward slashes, no trailing slash, leading slash forced.
pub fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let trimmed = unified.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Applies the first (longest-source-prefix) mapping that matches
/// `source_path`; returns the input unchanged (normalized) if none match.
pub fn translate(source_path: &str, mappings: &[PathMapping]) -> String {
    let normalized = normalize(source_path);

    let mut ordered: Vec<&PathMapping> = mappings.iter().collect();
    ordered.sort_by(|a, b| b.source_prefix.len().cmp(&a.source_prefix.len()));

    for mapping in ordered {
        let prefix = normalize(&mapping.source_prefix);
        if normalized == prefix || normalized.starts_with(&format!("{prefix}/")) {
            let remainder = &normalized[prefix.len()..];
            let target = normalize(&mapping.target_prefix);
            return format!("{target}{remainder}");
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetcharr_model::{MappingScope, ManagerKind};

    fn mapping(source: &str, target: &str) -> PathMapping {
        PathMapping::new(MappingScope::Manager(ManagerKind::Radarr), source, target)
    }

    #[test]
    fn longest_prefix_wins_over_a_shorter_overlapping_one() {
        let mappings = vec![mapping("/data", "/mnt/data"), mapping("/data/movies", "/mnt/movies")];
        let result = translate("/data/movies/Inception (2010)", &mappings);
        assert_eq!(result, "/mnt/movies/Inception (2010)");
    }

    #[test]
    fn unmatched_path_is_returned_normalized_but_unchanged() {
        let mappings = vec![mapping("/data", "/mnt/data")];
        let result = translate("other\\root\\file.mkv", &mappings);
        assert_eq!(result, "/other/root/file.mkv");
    }

    #[test]
    fn trailing_slashes_and_backslashes_are_normalized_before_matching() {
        let mappings = vec![mapping("/data/", "/mnt/data")];
        let result = translate("/data\\movies\\Foo", &mappings);
        assert_eq!(result, "/mnt/data/movies/Foo");
    }
}
