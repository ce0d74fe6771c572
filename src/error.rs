//! Error taxonomy for the reading pipeline.
//!
//! Every geometric or segmentation stage fails fast with one of these
//! variants and aborts the cycle; there is no partial reading. Validation
//! outcomes (low confidence, implausible value) are *not* errors — they are
//! a normal terminal state of `reading::validate` and live in
//! [`crate::reading::Verdict`].

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReaderError>;

#[derive(Error, Debug)]
pub enum ReaderError {
    /// The image collaborator produced nothing usable this cycle.
    #[error("image unavailable: {0}")]
    ImageUnavailable(String),

    /// The circle transform returned zero candidates in the radius band.
    #[error("no gauge circle found (radius band {min_radius:.0}..{max_radius:.0} px)")]
    NoGaugeFound { min_radius: f32, max_radius: f32 },

    /// The square crop window around the circle extends past the frame edge.
    #[error(
        "crop window out of bounds: circle ({cx:.1}, {cy:.1}) r={r:.1} in {width}x{height} frame"
    )]
    CropOutOfBounds {
        cx: f32,
        cy: f32,
        r: f32,
        width: usize,
        height: usize,
    },

    /// The line transform found no lines, so no rotation can be derived.
    /// Rotating by a default of zero would silently invalidate every digit
    /// box downstream, so this aborts the cycle instead.
    #[error("no lines detected, cannot derive gauge rotation")]
    NoLinesDetected,

    /// Dynamic segmentation did not yield exactly the expected digit count.
    #[error("expected {expected} digits, segmentation found {found}")]
    DigitCountMismatch { expected: usize, found: usize },

    /// The calibration record failed validation on load.
    #[error("calibration record invalid: {0}")]
    CalibrationInvalid(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ReaderError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a JSON error with the file it occurred on.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
