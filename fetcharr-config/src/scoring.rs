use serde::{Deserialize, Serialize};

/// §4.G scoring weights; `w_res + w_votes + w_lang + w_provider + w_aspect`
/// must sum to 1. Configurable per library; this is the system default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub w_resolution: f64,
    pub w_votes: f64,
    pub w_language: f64,
    pub w_provider: f64,
    pub w_aspect: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            w_resolution: 0.25,
            w_votes: 0.30,
            w_language: 0.20,
            w_provider: 0.15,
            w_aspect: 0.10,
        }
    }
}

impl ScoringWeights {
    pub fn sums_to_one(&self) -> bool {
        let total = self.w_resolution + self.w_votes + self.w_language + self.w_provider + self.w_aspect;
        (total - 1.0).abs() < 1e-6
    }
}

/// §4.G/§4.B selection tuning, plus the §4.B pHash threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    /// `target_pixels` ~= 4K used by the resolution sub-score.
    pub target_pixels: f64,
    pub min_width: i32,
    pub min_height: i32,
    pub max_count: usize,
    /// similarity threshold, default 0.92 => Hamming distance <= ~5 bits.
    pub phash_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            target_pixels: 3840.0 * 2160.0,
            min_width: 500,
            min_height: 500,
            max_count: 1,
            phash_threshold: 0.92,
        }
    }
}
