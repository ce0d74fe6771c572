//! Production configuration file (JSON).
//!
//! One file per deployed gauge. Everything except the stores has a default,
//! so a minimal config is just the image source and the two store paths.

use crate::classify::{Classifier, KnnClassifier, TemplateClassifier};
use crate::error::{ReaderError, Result};
use crate::hough::CircleOptions;
use crate::orient::AngleOptions;
use crate::params::ReaderParams;
use crate::reading::ValidateOptions;
use crate::segment::SegmentOptions;
use crate::telemetry::TelemetryConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub image: ImageSourceConfig,
    /// Path of the persisted calibration record.
    pub calibration_path: PathBuf,
    /// Path of the last-known-good store.
    pub last_known_good_path: PathBuf,
    /// Telemetry endpoint; omit to run without pushing.
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
    #[serde(default)]
    pub segmenter: SegmenterKind,
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Where each cycle's frame comes from. With both set, the URL wins unless
/// the run is measure-only.
#[derive(Debug, Default, Deserialize)]
pub struct ImageSourceConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SegmenterKind {
    /// Fixed boxes from the calibration record.
    #[default]
    Static,
    /// Contour detection on every cycle.
    Dynamic,
}

#[derive(Debug, Deserialize)]
pub struct ClassifierConfig {
    pub kind: ClassifierKind,
    /// Root of the labeled corpus / template library
    /// (`<root>/<digit>/*.png`).
    pub corpus_dir: PathBuf,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    Knn,
    Template,
}

/// Stage tuning, all optional in the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub preprocess_kernel: Option<usize>,
    pub digit_count: Option<usize>,
    pub decimal_places: Option<u32>,
    pub circle: Option<CircleOptions>,
    pub angle: Option<AngleOptions>,
    pub segment: Option<SegmentOptions>,
    pub validate: Option<ValidateOptions>,
    pub knn_k: Option<usize>,
    pub harvest_threshold: Option<f32>,
    pub harvest_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| ReaderError::io(path, e))?;
        serde_json::from_str(&data).map_err(|e| ReaderError::json(path, e))
    }

    /// Fold the optional tuning overrides into the default parameters.
    pub fn reader_params(&self) -> ReaderParams {
        let mut params = ReaderParams::default();
        let p = &self.pipeline;
        if let Some(v) = p.preprocess_kernel {
            params.preprocess_kernel = v;
        }
        if let Some(v) = p.digit_count {
            params.digit_count = v;
        }
        if let Some(v) = p.decimal_places {
            params.decimal_places = v;
        }
        if let Some(v) = &p.circle {
            params.circle = v.clone();
        }
        if let Some(v) = &p.angle {
            params.angle = v.clone();
        }
        if let Some(v) = &p.segment {
            params.segment = v.clone();
        }
        if let Some(v) = &p.validate {
            params.validate = v.clone();
        }
        if let Some(v) = p.knn_k {
            params.knn_k = v;
        }
        if let Some(v) = p.harvest_threshold {
            params.harvest_threshold = v;
        }
        params.harvest_dir = p.harvest_dir.clone();
        params
    }

    /// Build the configured classifier, loading its corpus from disk.
    pub fn build_classifier(&self, knn_k: usize) -> Result<Classifier> {
        match self.classifier.kind {
            ClassifierKind::Knn => Ok(Classifier::Knn(KnnClassifier::from_dir(
                &self.classifier.corpus_dir,
                knn_k,
            )?)),
            ClassifierKind::Template => Ok(Classifier::Template(TemplateClassifier::from_dir(
                &self.classifier.corpus_dir,
            )?)),
        }
    }
}
