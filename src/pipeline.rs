//! The detection cycle, end to end.
//!
//! `MeterReader` wires preprocessing, gauge localization, rotation
//! correction, segmentation, classification, assembly and validation into
//! one fail-fast pass over a frame. Geometry comes either from the
//! calibration record (production) or is discovered per frame (calibration
//! and tuning runs). Each stage fully consumes its input before the next
//! runs; there is no concurrency across stages and no partial reading.

use crate::classify::{Classifier, DigitPrediction, GlyphSink};
use crate::debug::DebugSink;
use crate::error::Result;
use crate::filter::median_blur;
use crate::frame::Frame;
use crate::gauge::{crop_to_circle, locate_gauge, Circle};
use crate::orient::{find_angle, leveling_degrees, rotate};
use crate::params::ReaderParams;
use crate::reading::{assemble, validate, Reading, Verdict};
use crate::segment::Segmenter;
use log::{debug, info};
use std::time::Instant;

/// Where the cycle gets its gauge geometry from.
#[derive(Clone, Debug)]
pub enum Geometry {
    /// Run the circle and angle detectors on every frame.
    Discover,
    /// Reuse frozen geometry; no detection.
    Calibrated { circle: Circle, angle_rad: f32 },
}

impl Geometry {
    pub fn from_record(record: &crate::calibration::CalibrationRecord) -> Self {
        Geometry::Calibrated {
            circle: record.circle,
            angle_rad: record.angle_rad,
        }
    }
}

/// Result of one detection cycle.
#[derive(Clone, Debug)]
pub struct CycleOutcome {
    pub reading: Reading,
    pub verdict: Verdict,
    pub latency_ms: f64,
}

/// One-gauge reader: construct once, run once per polling interval.
pub struct MeterReader {
    params: ReaderParams,
    geometry: Geometry,
    segmenter: Segmenter,
    classifier: Classifier,
    glyph_sink: GlyphSink,
    debug_sink: DebugSink,
}

impl MeterReader {
    pub fn new(
        params: ReaderParams,
        geometry: Geometry,
        segmenter: Segmenter,
        classifier: Classifier,
    ) -> Self {
        let glyph_sink = GlyphSink::new(params.harvest_dir.clone(), params.harvest_threshold);
        Self {
            params,
            geometry,
            segmenter,
            classifier,
            glyph_sink,
            debug_sink: DebugSink::disabled(),
        }
    }

    /// Attach a debug artifact sink; snapshots of every stage get written
    /// through it.
    pub fn with_debug_sink(mut self, sink: DebugSink) -> Self {
        self.debug_sink = sink;
        self
    }

    /// Run one full cycle on a grayscale frame.
    ///
    /// `last_known_good` is the previously accepted value, if any; `force`
    /// bypasses validation. The caller owns persisting the accepted value
    /// and pushing it out.
    pub fn process(
        &self,
        frame: &Frame,
        last_known_good: Option<f64>,
        force: bool,
    ) -> Result<CycleOutcome> {
        let start = Instant::now();
        info!("cycle start, frame {}x{}", frame.w, frame.h);
        self.debug_sink.save("gray", frame);

        let circle = match &self.geometry {
            Geometry::Calibrated { circle, .. } => {
                debug!("using calibrated geometry");
                *circle
            }
            Geometry::Discover => {
                // the blur only feeds circle detection; calibrated runs
                // skip both
                let blurred = median_blur(frame, self.params.preprocess_kernel);
                let circle = locate_gauge(&blurred, &self.params.circle)?;
                self.debug_sink.save_with_circle("circles", frame, &circle);
                circle
            }
        };

        let crop = crop_to_circle(frame, &circle)?;
        self.debug_sink.save("crop", &crop);

        let angle_rad = match &self.geometry {
            Geometry::Calibrated { angle_rad, .. } => *angle_rad,
            Geometry::Discover => {
                let estimate = find_angle(&crop, &self.params.angle)?;
                self.debug_sink.save("edges", &estimate.edge_map);
                estimate.angle_rad
            }
        };

        let leveled = rotate(&crop, leveling_degrees(angle_rad));
        self.debug_sink.save("rotated", &leveled);

        let glyphs = self.segmenter.segment(&leveled, self.params.digit_count)?;
        if self.debug_sink.is_enabled() {
            for glyph in &glyphs {
                self.debug_sink.save("glyph", &glyph.raster);
            }
        }

        let predictions: Vec<DigitPrediction> = glyphs
            .iter()
            .map(|glyph| {
                let prediction = self.classifier.classify(glyph);
                self.glyph_sink.harvest(glyph, &prediction);
                prediction
            })
            .collect();

        let reading = assemble(predictions, self.params.decimal_places);
        let verdict = validate(&reading, last_known_good, &self.params.validate, force);

        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            "cycle done in {latency_ms:.1} ms: value {:.2}, {}",
            reading.value,
            if verdict.is_accepted() {
                "accepted"
            } else {
                "rejected"
            }
        );
        Ok(CycleOutcome {
            reading,
            verdict,
            latency_ms,
        })
    }
}
