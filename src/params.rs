//! Parameter types configuring the pipeline stages.
//!
//! Defaults are the values hand-tuned against the reference meter: a
//! 3280×2464 capture with the gauge face between 200 and 300 px radius,
//! seven digit windows, two of which sit behind the decimal point.

use crate::hough::CircleOptions;
use crate::orient::AngleOptions;
use crate::reading::ValidateOptions;
use crate::segment::SegmentOptions;
use std::path::PathBuf;

/// Reader-wide parameters for one deployment.
#[derive(Clone, Debug)]
pub struct ReaderParams {
    /// Median kernel applied to the raw frame before circle detection.
    pub preprocess_kernel: usize,
    /// Digit positions on the meter face.
    pub digit_count: usize,
    /// Digits behind the decimal point.
    pub decimal_places: u32,
    /// Circle transform knobs (radius band, vote gates).
    pub circle: CircleOptions,
    /// Rotation-correction knobs (Canny thresholds, line votes).
    pub angle: AngleOptions,
    /// Dynamic segmentation knobs.
    pub segment: SegmentOptions,
    /// Acceptance policy (plausible-increment bound, confidence floor).
    pub validate: ValidateOptions,
    /// k for the nearest-neighbour classifier.
    pub knn_k: usize,
    /// Predictions below this go to the labeling sink.
    pub harvest_threshold: f32,
    /// Where low-confidence glyphs are harvested to; `None` disables.
    pub harvest_dir: Option<PathBuf>,
}

impl Default for ReaderParams {
    fn default() -> Self {
        Self {
            preprocess_kernel: 5,
            digit_count: 7,
            decimal_places: 2,
            circle: CircleOptions::default(),
            angle: AngleOptions::default(),
            segment: SegmentOptions::default(),
            validate: ValidateOptions::default(),
            knn_k: 5,
            harvest_threshold: 0.95,
            harvest_dir: None,
        }
    }
}
