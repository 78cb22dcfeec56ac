use serde::{Deserialize, Serialize};

/// §4.H step 1 "required fields per media type" table. Field names match
/// `fetcharr_model::media_item::MediaMetadata`'s scalar fields plus `title`
/// and `year`; an item failing one of these checks fails publish validation
/// rather than retrying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequiredFields {
    pub title: bool,
    pub year: bool,
    pub plot: bool,
    pub runtime: bool,
}

impl Default for RequiredFields {
    fn default() -> Self {
        Self { title: true, year: false, plot: true, runtime: false }
    }
}

/// §4.H completeness requirements, configurable per media kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletenessConfig {
    pub movie: RequiredFields,
    pub tv: RequiredFields,
    pub music: RequiredFields,
}

impl Default for CompletenessConfig {
    fn default() -> Self {
        Self {
            movie: RequiredFields { title: true, year: true, plot: true, runtime: false },
            tv: RequiredFields { title: true, year: false, plot: true, runtime: false },
            music: RequiredFields { title: true, year: false, plot: false, runtime: false },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_defaults_require_year_but_music_does_not() {
        let config = CompletenessConfig::default();
        assert!(config.movie.year);
        assert!(!config.music.year);
    }
}
