//! Digit classification: map a glyph to a digit plus a confidence score.
//!
//! Two interchangeable strategies behind one tagged enum, chosen by
//! configuration at startup:
//!
//! - [`KnnClassifier`] — k nearest neighbours on raw pixel vectors.
//! - [`TemplateClassifier`] — normalized cross-correlation against a
//!   per-digit template library.
//!
//! Classification never fails; a low confidence is the caller's signal to
//! distrust the result, not an error. Glyphs below the harvest threshold
//! are persisted as labeled candidates for the next training round.

mod knn;
mod template;

pub use knn::KnnClassifier;
pub use template::TemplateClassifier;

use crate::segment::Glyph;
use log::{debug, warn};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// One classified digit with the classifier's certainty in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DigitPrediction {
    pub digit: u8,
    pub confidence: f32,
}

/// Classifier strategy, an explicit tagged choice made at startup.
#[derive(Debug)]
pub enum Classifier {
    Knn(KnnClassifier),
    Template(TemplateClassifier),
}

impl Classifier {
    /// Best-available guess for a glyph. Always returns a prediction.
    pub fn classify(&self, glyph: &Glyph) -> DigitPrediction {
        let prediction = match self {
            Classifier::Knn(knn) => knn.classify(glyph),
            Classifier::Template(tpl) => tpl.classify(glyph),
        };
        debug!(
            "best guess: {}, confidence: {:.3}",
            prediction.digit, prediction.confidence
        );
        prediction
    }
}

/// Side-channel store growing the training corpus: glyphs the classifier
/// was unsure about are written out keyed by predicted digit and timestamp,
/// to be hand-labeled later. Failures are logged, never propagated — this
/// is observability, not part of the classification contract.
#[derive(Clone, Debug, Default)]
pub struct GlyphSink {
    dir: Option<PathBuf>,
    threshold: f32,
}

impl GlyphSink {
    pub fn new(dir: Option<PathBuf>, threshold: f32) -> Self {
        Self { dir, threshold }
    }

    /// Disabled sink, drops everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Persist the glyph when its prediction fell below the threshold.
    pub fn harvest(&self, glyph: &Glyph, prediction: &DigitPrediction) {
        let Some(dir) = &self.dir else { return };
        if prediction.confidence >= self.threshold {
            return;
        }
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let path = dir.join(format!("{}-{}.png", prediction.digit, stamp));
        if let Err(err) = crate::io::save_grayscale(&glyph.raster, &path) {
            warn!("could not save low-confidence glyph to {}: {err}", path.display());
        }
    }
}
