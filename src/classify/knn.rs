//! k-nearest-neighbour classification on raw pixel vectors.
//!
//! The training corpus is a directory tree `<root>/<digit>/*.png` of
//! hand-labeled glyph images, each resized to the standard glyph size and
//! flattened. At inference the query glyph is compared to every sample by
//! squared Euclidean distance; the majority label among the k nearest wins
//! and the winning-vote fraction is the confidence.

use super::DigitPrediction;
use crate::error::Result;
use crate::segment::{Glyph, GLYPH_SIZE};
use log::info;
use rayon::prelude::*;
use std::path::Path;

#[derive(Clone, Debug)]
pub struct KnnClassifier {
    k: usize,
    samples: Vec<(u8, Vec<u8>)>,
}

impl KnnClassifier {
    /// Build from an in-memory labeled corpus. `k` is forced odd to avoid
    /// even splits.
    pub fn from_samples(k: usize, samples: Vec<(u8, Vec<u8>)>) -> Self {
        Self { k: k.max(1) | 1, samples }
    }

    /// Load the labeled corpus from `<root>/<0..=9>/*.png`. Directories for
    /// digits with no samples yet may be absent.
    pub fn from_dir(root: &Path, k: usize) -> Result<Self> {
        let mut samples = Vec::new();
        for digit in 0u8..10 {
            let dir = root.join(digit.to_string());
            if !dir.is_dir() {
                continue;
            }
            let entries = std::fs::read_dir(&dir)
                .map_err(|e| crate::error::ReaderError::io(&dir, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| crate::error::ReaderError::io(&dir, e))?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("png") {
                    continue;
                }
                let frame = crate::io::load_grayscale(&path)?;
                let resized = frame.resize(GLYPH_SIZE, GLYPH_SIZE);
                samples.push((digit, resized.data));
            }
        }
        info!("loaded {} labeled glyph samples from {}", samples.len(), root.display());
        Ok(Self::from_samples(k, samples))
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Majority vote among the k nearest samples. With an empty corpus this
    /// degrades to digit 0 at zero confidence rather than failing.
    pub fn classify(&self, glyph: &Glyph) -> DigitPrediction {
        if self.samples.is_empty() {
            return DigitPrediction {
                digit: 0,
                confidence: 0.0,
            };
        }
        let query = glyph.vector();
        let mut scored: Vec<(u64, u8)> = self
            .samples
            .par_iter()
            .map(|(label, pixels)| (squared_distance(query, pixels), *label))
            .collect();
        scored.sort_unstable_by_key(|&(d, _)| d);

        let k = self.k.min(scored.len());
        let mut votes = [0u32; 10];
        for &(_, label) in &scored[..k] {
            votes[label as usize] += 1;
        }
        let digit = (0..10).max_by_key(|&d| votes[d]).unwrap_or(0) as u8;
        DigitPrediction {
            digit,
            confidence: votes[digit as usize] as f32 / k as f32,
        }
    }
}

#[inline]
fn squared_distance(a: &[u8], b: &[u8]) -> u64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as i64 - y as i64;
            (d * d) as u64
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    fn glyph_with_corner(v: u8) -> Glyph {
        let mut f = Frame::new(GLYPH_SIZE, GLYPH_SIZE);
        for y in 0..10 {
            for x in 0..10 {
                f.set(x, y, v);
            }
        }
        Glyph { raster: f }
    }

    fn corpus() -> Vec<(u8, Vec<u8>)> {
        // digit 1 samples have a bright corner, digit 2 samples a dim one
        vec![
            (1, glyph_with_corner(250).raster.data.clone()),
            (1, glyph_with_corner(240).raster.data.clone()),
            (1, glyph_with_corner(230).raster.data.clone()),
            (2, glyph_with_corner(60).raster.data.clone()),
            (2, glyph_with_corner(50).raster.data.clone()),
        ]
    }

    #[test]
    fn nearest_cluster_wins_with_full_confidence() {
        let knn = KnnClassifier::from_samples(3, corpus());
        let p = knn.classify(&glyph_with_corner(245));
        assert_eq!(p.digit, 1);
        assert!((p.confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn split_vote_lowers_confidence() {
        let knn = KnnClassifier::from_samples(5, corpus());
        let p = knn.classify(&glyph_with_corner(55));
        // the 5 nearest are 2 twos and 3 ones ordered by distance; the twos
        // are closest but the ones outnumber them
        assert_eq!(p.digit, 1);
        assert!((p.confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn empty_corpus_degrades_to_zero_confidence() {
        let knn = KnnClassifier::from_samples(5, Vec::new());
        let p = knn.classify(&glyph_with_corner(100));
        assert_eq!(p.digit, 0);
        assert_eq!(p.confidence, 0.0);
    }

    #[test]
    fn even_k_is_rounded_up_to_odd() {
        let knn = KnnClassifier::from_samples(4, corpus());
        let p = knn.classify(&glyph_with_corner(245));
        assert_eq!(p.digit, 1);
    }
}
