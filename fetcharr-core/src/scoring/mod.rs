//! §4.G scoring & selection engine.

use std::collections::BTreeSet;

use fetcharr_config::ScoringConfig;
use fetcharr_model::{AssetCandidate, AssetType, AutomationMode, ProviderId, SelectedBy};

use crate::phash::{self, PerceptualHash};

/// Scores and marks candidates in place, per §4.G's five-step pipeline.
/// `hashes` supplies a precomputed perceptual hash per candidate (by index,
/// parallel to `candidates`); candidates with no hash (not yet downloaded)
/// are never deduplicated against each other, only scored/ranked.
pub fn run(
    candidates: &mut [AssetCandidate],
    hashes: &[Option<PerceptualHash>],
    asset_type: AssetType,
    config: &ScoringConfig,
    preferred_language: &str,
    provider_priority: &[ProviderId],
    mode: AutomationMode,
    globally_rejected: &BTreeSet<(ProviderId, String)>,
) {
    debug_assert_eq!(candidates.len(), hashes.len());

    // Step 1: filter by minimums and rejection.
    let mut survivors: Vec<usize> = (0..candidates.len())
        .filter(|&i| {
            let c = &candidates[i];
            if c.is_rejected {
                return false;
            }
            if globally_rejected.contains(&(c.provider, c.source_url.clone())) {
                return false;
            }
            let wide_enough = c.width.map(|w| w >= config.min_width).unwrap_or(true);
            let tall_enough = c.height.map(|h| h >= config.min_height).unwrap_or(true);
            wide_enough && tall_enough
        })
        .collect();

    // Step 2: score.
    for &i in &survivors {
        let score = score_candidate(&candidates[i], asset_type, config, preferred_language);
        candidates[i].score = Some(score);
    }

    // Step 3: sort descending by score, tie-break by provider priority,
    // then resolution, then source URL for determinism.
    survivors.sort_by(|&a, &b| {
        let ca = &candidates[a];
        let cb = &candidates[b];
        cb.score
            .partial_cmp(&ca.score)
            .unwrap()
            .then_with(|| provider_rank(cb.provider, provider_priority).cmp(&provider_rank(ca.provider, provider_priority)).reverse())
            .then_with(|| resolution(cb).cmp(&resolution(ca)))
            .then_with(|| ca.source_url.cmp(&cb.source_url))
    });

    // Step 4: perceptual-hash dedup, keeping the earlier (higher-scored) entry.
    let mut kept: Vec<usize> = Vec::new();
    for &i in &survivors {
        let is_dup = hashes[i].is_some_and(|hash| {
            kept.iter().any(|&kept_i| hashes[kept_i].is_some_and(|kept_hash| hash.is_duplicate_of(kept_hash, config.phash_threshold)))
        });
        if !is_dup {
            kept.push(i);
        }
    }

    // Step 5: select the top `max_count`, honoring automation mode.
    let selected: BTreeSet<usize> = kept.iter().take(config.max_count).copied().collect();
    for (i, candidate) in candidates.iter_mut().enumerate() {
        if !selected.contains(&i) {
            continue;
        }
        match mode {
            AutomationMode::Manual => {}
            AutomationMode::Yolo => candidate.select(SelectedBy::Auto),
            AutomationMode::Hybrid => candidate.select(SelectedBy::Auto),
        }
    }
}

/// Hybrid mode marks selections but must withhold auto-publish pending
/// review; callers gate publish on this rather than on `is_selected` alone.
pub fn requires_review_before_publish(mode: AutomationMode) -> bool {
    matches!(mode, AutomationMode::Hybrid)
}

fn provider_rank(provider: ProviderId, priority: &[ProviderId]) -> usize {
    priority.iter().position(|p| *p == provider).unwrap_or(usize::MAX)
}

fn resolution(candidate: &AssetCandidate) -> i64 {
    match (candidate.width, candidate.height) {
        (Some(w), Some(h)) => w as i64 * h as i64,
        _ => 0,
    }
}

fn score_candidate(candidate: &AssetCandidate, asset_type: AssetType, config: &ScoringConfig, preferred_language: &str) -> f64 {
    let weights = &config.weights;

    let r = match (candidate.width, candidate.height) {
        (Some(w), Some(h)) => ((w as f64 * h as f64 / config.target_pixels as f64) * 100.0).min(100.0),
        _ => 0.0,
    };

    let v = (candidate.vote_count as f64 / 100.0 * 50.0).clamp(0.0, 50.0) + (candidate.vote_average / 10.0) * 50.0;

    let l = match &candidate.language {
        Some(lang) if lang.eq_ignore_ascii_case(preferred_language) => 100.0,
        _ => 0.0,
    };

    let p = candidate.provider.base_priority() * 100.0;

    let a = match (candidate.width, candidate.height, asset_type.ideal_aspect_ratio()) {
        (Some(w), Some(h), Some(ideal_ratio)) if h != 0 => {
            let actual_ratio = w as f64 / h as f64;
            100.0 - ((ideal_ratio - actual_ratio).abs() * 200.0).min(100.0)
        }
        // No ideal ratio for this asset type (trailer/subtitle never reach
        // scoring, but stay defensive): contribute a neutral mid-score.
        (_, _, None) => 50.0,
        _ => 0.0,
    };

    (weights.w_resolution * r + weights.w_votes * v + weights.w_language * l + weights.w_provider * p + weights.w_aspect * a)
        .clamp(0.0, 100.0)
}

/// Convenience wrapper combining pHash computation with `run`, for callers
/// that still have the decoded images on hand (e.g. just after download).
pub fn phash_for_image(image: &image::DynamicImage) -> PerceptualHash {
    phash::compute(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetcharr_config::ScoringWeights;
    use fetcharr_model::MediaItemId;

    fn config() -> ScoringConfig {
        ScoringConfig { weights: ScoringWeights::default(), max_count: 1, ..ScoringConfig::default() }
    }

    fn candidate(provider: ProviderId, width: i32, height: i32, votes: i32, rating: f64) -> AssetCandidate {
        let mut c = AssetCandidate::new(MediaItemId::new(), AssetType::Poster, provider, format!("https://x/{provider}.jpg"));
        c.width = Some(width);
        c.height = Some(height);
        c.vote_count = votes;
        c.vote_average = rating;
        c
    }

    #[test]
    fn higher_resolution_and_vote_count_score_higher() {
        let cfg = config();
        let weak = candidate(ProviderId::Tmdb, 500, 750, 5, 5.0);
        let strong = candidate(ProviderId::Tmdb, 2000, 3000, 500, 9.0);

        let weak_score = score_candidate(&weak, AssetType::Poster, &cfg, "en");
        let strong_score = score_candidate(&strong, AssetType::Poster, &cfg, "en");
        assert!(strong_score > weak_score);
    }

    #[test]
    fn top_n_are_selected_in_yolo_mode() {
        let cfg = config();
        let mut candidates = vec![
            candidate(ProviderId::FanartTv, 2000, 3000, 500, 9.0),
            candidate(ProviderId::Local, 500, 750, 1, 1.0),
        ];
        let hashes = vec![None, None];

        run(&mut candidates, &hashes, AssetType::Poster, &cfg, "en", &[ProviderId::FanartTv, ProviderId::Local], AutomationMode::Yolo, &BTreeSet::new());

        assert!(candidates[0].is_selected);
        assert!(!candidates[1].is_selected);
    }

    #[test]
    fn manual_mode_scores_but_never_selects() {
        let cfg = config();
        let mut candidates = vec![candidate(ProviderId::Tmdb, 2000, 3000, 500, 9.0)];
        let hashes = vec![None];

        run(&mut candidates, &hashes, AssetType::Poster, &cfg, "en", &[], AutomationMode::Manual, &BTreeSet::new());

        assert!(candidates[0].score.is_some());
        assert!(!candidates[0].is_selected);
    }

    #[test]
    fn below_minimum_dimensions_are_filtered_out() {
        let mut cfg = config();
        cfg.min_width = 1000;
        cfg.max_count = 2;
        let mut candidates = vec![candidate(ProviderId::Tmdb, 500, 750, 500, 9.0)];
        let hashes = vec![None];

        run(&mut candidates, &hashes, AssetType::Poster, &cfg, "en", &[], AutomationMode::Yolo, &BTreeSet::new());

        assert!(!candidates[0].is_selected);
        assert!(candidates[0].score.is_none());
    }

    #[test]
    fn globally_rejected_pairs_are_excluded() {
        let cfg = config();
        let mut candidates = vec![candidate(ProviderId::Tmdb, 2000, 3000, 500, 9.0)];
        let url = candidates[0].source_url.clone();
        let hashes = vec![None];
        let mut rejected = BTreeSet::new();
        rejected.insert((ProviderId::Tmdb, url));

        run(&mut candidates, &hashes, AssetType::Poster, &cfg, "en", &[], AutomationMode::Yolo, &rejected);

        assert!(!candidates[0].is_selected);
    }

    #[test]
    fn hybrid_mode_selects_but_flags_review_required() {
        assert!(requires_review_before_publish(AutomationMode::Hybrid));
        assert!(!requires_review_before_publish(AutomationMode::Yolo));
    }
}
