//! §4.B perceptual-hash deduper: resize to 32×32, greyscale, DCT, keep the
//! low-frequency 8×8 corner, hash = each coefficient's sign relative to the
//! corner's median (excluding the DC term). Two images are duplicates iff
//! `hamming_distance(a, b) <= threshold_for(similarity)`.

use image::{imageops::FilterType, DynamicImage, GenericImageView};

const SIDE: u32 = 32;
const LOW_FREQ: usize = 8;

/// A 64-bit perceptual hash, one bit per retained DCT coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PerceptualHash(pub u64);

impl PerceptualHash {
    pub fn hamming_distance(self, other: PerceptualHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// `similarity >= threshold` (default 0.92) implies "duplicate". 64 bits
    /// total, so a similarity threshold maps linearly to a max bit distance.
    pub fn max_distance_for_similarity(similarity: f64) -> u32 {
        let allowed_fraction = (1.0 - similarity).clamp(0.0, 1.0);
        (allowed_fraction * 64.0).round() as u32
    }

    pub fn is_duplicate_of(self, other: PerceptualHash, similarity_threshold: f64) -> bool {
        self.hamming_distance(other) <= Self::max_distance_for_similarity(similarity_threshold)
    }
}

pub fn compute(image: &DynamicImage) -> PerceptualHash {
    let grey = image.resize_exact(SIDE, SIDE, FilterType::Lanczos3).grayscale();
    let mut samples = [[0f64; SIDE as usize]; SIDE as usize];
    for y in 0..SIDE {
        for x in 0..SIDE {
            let pixel = grey.get_pixel(x, y);
            samples[y as usize][x as usize] = pixel.0[0] as f64;
        }
    }

    let coefficients = dct_2d(&samples);

    // Median of the low-frequency block, excluding the DC term at (0, 0),
    // is the standard pHash threshold: it's robust to uniform brightness
    // shifts that a plain average would not be.
    let mut low_freq = Vec::with_capacity(LOW_FREQ * LOW_FREQ - 1);
    for y in 0..LOW_FREQ {
        for x in 0..LOW_FREQ {
            if x == 0 && y == 0 {
                continue;
            }
            low_freq.push(coefficients[y][x]);
        }
    }
    low_freq.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let median = low_freq[low_freq.len() / 2];

    let mut hash: u64 = 0;
    let mut bit = 0u32;
    for y in 0..LOW_FREQ {
        for x in 0..LOW_FREQ {
            if x == 0 && y == 0 {
                continue;
            }
            if coefficients[y][x] > median {
                hash |= 1 << bit;
            }
            bit += 1;
        }
    }

    PerceptualHash(hash)
}

/// Naive separable 2D DCT-II over a 32×32 block. `SIDE` is small enough that
/// an O(n^2) per axis transform (no FFT) is fine for this cardinality.
fn dct_2d(input: &[[f64; SIDE as usize]; SIDE as usize]) -> Vec<Vec<f64>> {
    let n = SIDE as usize;
    let rows_transformed: Vec<Vec<f64>> = input.iter().map(|row| dct_1d(row)).collect();

    let mut columns_transformed = vec![vec![0f64; n]; n];
    for x in 0..n {
        let column: Vec<f64> = rows_transformed.iter().map(|row| row[x]).collect();
        let transformed = dct_1d(&column);
        for y in 0..n {
            columns_transformed[y][x] = transformed[y];
        }
    }
    columns_transformed
}

fn dct_1d(input: &[f64]) -> Vec<f64> {
    let n = input.len();
    let mut output = vec![0f64; n];
    for (k, out) in output.iter_mut().enumerate() {
        let mut sum = 0f64;
        for (i, &value) in input.iter().enumerate() {
            sum += value * ((std::f64::consts::PI / n as f64) * (i as f64 + 0.5) * k as f64).cos();
        }
        let scale = if k == 0 { (1.0 / n as f64).sqrt() } else { (2.0 / n as f64).sqrt() };
        *out = sum * scale;
    }
    output
}

/// Deduplicate a slice of `(phash, score)` pairs, always keeping the
/// higher-scored member of a duplicate pair. Returns indices to keep.
pub fn dedup_keep_highest_scored(items: &[(PerceptualHash, f64)], similarity_threshold: f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| items[b].1.partial_cmp(&items[a].1).unwrap());

    let mut kept: Vec<usize> = Vec::new();
    for &idx in &order {
        let is_dup = kept
            .iter()
            .any(|&kept_idx| items[idx].0.is_duplicate_of(items[kept_idx].0, similarity_threshold));
        if !is_dup {
            kept.push(idx);
        }
    }
    kept.sort();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_images_hash_to_zero_distance() {
        let image = DynamicImage::new_rgb8(64, 64);
        let a = compute(&image);
        let b = compute(&image);
        assert_eq!(a.hamming_distance(b), 0);
        assert!(a.is_duplicate_of(b, 0.92));
    }

    #[test]
    fn default_threshold_allows_a_handful_of_differing_bits() {
        // similarity 0.92 over 64 bits: (1-0.92)*64 ~= 5.12, rounds to 5.
        assert_eq!(PerceptualHash::max_distance_for_similarity(0.92), 5);
    }

    #[test]
    fn dedup_keeps_the_higher_scored_of_a_duplicate_pair() {
        let a = PerceptualHash(0b0000);
        let b = PerceptualHash(0b0001);
        let c = PerceptualHash(0b1111_1111);
        let items = vec![(a, 50.0), (b, 90.0), (c, 10.0)];
        let kept = dedup_keep_highest_scored(&items, 0.92);
        assert_eq!(kept, vec![1, 2]);
    }
}
