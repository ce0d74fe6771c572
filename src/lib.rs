#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod calibration;
pub mod classify;
pub mod config;
pub mod debug;
pub mod error;
pub mod frame;
pub mod gauge;
pub mod params;
pub mod pipeline;
pub mod reading;
pub mod segment;
pub mod state;
pub mod telemetry;

// Lower-level building blocks, public for the tools and for tuning.
pub mod angle;
pub mod edges;
pub mod filter;
pub mod hough;
pub mod io;
pub mod orient;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::{ReaderError, Result};
pub use crate::pipeline::{CycleOutcome, Geometry, MeterReader};
pub use crate::reading::{RejectReason, Verdict};

/// Small prelude for quick experiments and the binaries.
pub mod prelude {
    pub use crate::calibration::CalibrationRecord;
    pub use crate::classify::{Classifier, DigitPrediction, KnnClassifier, TemplateClassifier};
    pub use crate::debug::DebugSink;
    pub use crate::frame::Frame;
    pub use crate::gauge::Circle;
    pub use crate::params::ReaderParams;
    pub use crate::pipeline::{CycleOutcome, Geometry, MeterReader};
    pub use crate::reading::{Reading, RejectReason, Verdict};
    pub use crate::segment::{BoundingBox, Glyph, SegmentOptions, Segmenter};
    pub use crate::state::LastKnownGoodStore;
}
