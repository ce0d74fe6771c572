//! Template matching by normalized cross-correlation.
//!
//! Each digit class carries one or more reference glyph templates, loaded
//! from `<root>/<digit>/*.png`. Templates are normalized (zero mean, unit
//! norm) once at load time; a query glyph is normalized once per call, so a
//! classification is one dot product per template.

use super::DigitPrediction;
use crate::error::Result;
use crate::segment::{Glyph, GLYPH_SIZE};
use log::info;
use std::path::Path;

#[derive(Clone, Debug)]
pub struct TemplateClassifier {
    /// (digit class, zero-mean unit-norm pixel vector)
    templates: Vec<(u8, Vec<f32>)>,
}

impl TemplateClassifier {
    /// Build from in-memory reference glyphs, one `(digit, raster)` pair per
    /// template. Rasters are resized to the standard glyph size first.
    pub fn from_samples(samples: Vec<(u8, crate::frame::Frame)>) -> Self {
        let templates = samples
            .into_iter()
            .filter_map(|(digit, frame)| {
                let resized = frame.resize(GLYPH_SIZE, GLYPH_SIZE);
                normalize(&resized.data).map(|v| (digit, v))
            })
            .collect();
        Self { templates }
    }

    /// Load the template library from `<root>/<0..=9>/*.png`.
    pub fn from_dir(root: &Path) -> Result<Self> {
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
                samples.push((digit, crate::io::load_grayscale(&path)?));
            }
        }
        let classifier = Self::from_samples(samples);
        info!(
            "loaded {} digit templates from {}",
            classifier.templates.len(),
            root.display()
        );
        Ok(classifier)
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Best correlation over all templates. The raw score lies in [-1, 1];
    /// only the non-negative part is meaningful as a confidence, so it is
    /// clamped at zero. An empty library degrades to digit 0 at zero
    /// confidence rather than failing.
    pub fn classify(&self, glyph: &Glyph) -> DigitPrediction {
        let Some(query) = normalize(glyph.vector()) else {
            return DigitPrediction {
                digit: 0,
                confidence: 0.0,
            };
        };
        let mut best: Option<(u8, f32)> = None;
        for (digit, template) in &self.templates {
            let score: f32 = query.iter().zip(template.iter()).map(|(a, b)| a * b).sum();
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((*digit, score));
            }
        }
        match best {
            Some((digit, score)) => DigitPrediction {
                digit,
                confidence: score.clamp(0.0, 1.0),
            },
            None => DigitPrediction {
                digit: 0,
                confidence: 0.0,
            },
        }
    }
}

// Zero-mean, unit-norm vector; None for flat inputs with no contrast.
fn normalize(pixels: &[u8]) -> Option<Vec<f32>> {
    let n = pixels.len() as f32;
    if pixels.is_empty() {
        return None;
    }
    let mean = pixels.iter().map(|&v| v as f32).sum::<f32>() / n;
    let centered: Vec<f32> = pixels.iter().map(|&v| v as f32 - mean).collect();
    let norm = centered.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm < 1e-6 {
        return None;
    }
    Some(centered.into_iter().map(|v| v / norm).collect())
}
