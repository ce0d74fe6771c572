//! The calibration record: hand-tuned gauge geometry frozen for production.
//!
//! Produced by the `gauge-calibrate` tool, persisted as JSON, and loaded
//! read-only by every subsequent production run. Loading validates the
//! record before anything downstream may use it.

use crate::error::{ReaderError, Result};
use crate::gauge::Circle;
use crate::segment::BoundingBox;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Format version written into every record; bumped on layout changes.
pub const CALIBRATION_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CalibrationRecord {
    #[serde(default)]
    pub version: u32,
    /// The gauge face in full-frame pixel coordinates.
    pub circle: Circle,
    /// Dominant marking angle in radians; the leveling rotation derives
    /// from it.
    pub angle_rad: f32,
    /// Per-digit boxes in leveled-crop coordinates, most significant digit
    /// first.
    pub digit_boxes: Vec<BoundingBox>,
    pub digit_count: usize,
}

impl CalibrationRecord {
    pub fn new(circle: Circle, angle_rad: f32, digit_boxes: Vec<BoundingBox>) -> Self {
        let digit_count = digit_boxes.len();
        Self {
            version: CALIBRATION_VERSION,
            circle,
            angle_rad,
            digit_boxes,
            digit_count,
        }
    }

    /// Structural validation, applied on every load.
    pub fn validate(&self) -> Result<()> {
        if self.digit_count != self.digit_boxes.len() {
            return Err(ReaderError::CalibrationInvalid(format!(
                "digit_count {} does not match {} digit boxes",
                self.digit_count,
                self.digit_boxes.len()
            )));
        }
        if self.digit_count == 0 {
            return Err(ReaderError::CalibrationInvalid(
                "record contains no digit boxes".into(),
            ));
        }
        if self.circle.r <= 0.0 {
            return Err(ReaderError::CalibrationInvalid(format!(
                "non-positive gauge radius {}",
                self.circle.r
            )));
        }
        if let Some(b) = self.digit_boxes.iter().find(|b| b.w == 0 || b.h == 0) {
            return Err(ReaderError::CalibrationInvalid(format!(
                "degenerate digit box [{}, {}, {}, {}]",
                b.x, b.y, b.w, b.h
            )));
        }
        Ok(())
    }

    /// Load and validate a persisted record.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| ReaderError::io(path, e))?;
        let record: CalibrationRecord =
            serde_json::from_str(&data).map_err(|e| ReaderError::json(path, e))?;
        record.validate()?;
        info!(
            "loaded calibration: circle ({:.1}, {:.1}) r={:.1}, angle {:.3} rad, {} digits",
            record.circle.cx,
            record.circle.cy,
            record.circle.r,
            record.angle_rad,
            record.digit_count
        );
        Ok(record)
    }

    /// Persist the record as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        crate::io::write_json(path, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> CalibrationRecord {
        CalibrationRecord::new(
            Circle {
                cx: 208.5,
                cy: 121.6,
                r: 250.0,
            },
            1.68,
            vec![
                BoundingBox {
                    x: 14,
                    y: 16,
                    w: 31,
                    h: 34,
                };
                7
            ],
        )
    }

    #[test]
    fn new_record_is_consistent() {
        let record = sample_record();
        assert_eq!(record.digit_count, 7);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn count_mismatch_is_invalid() {
        let mut record = sample_record();
        record.digit_count = 6;
        let err = record.validate().unwrap_err();
        assert!(matches!(err, ReaderError::CalibrationInvalid(_)));
    }

    #[test]
    fn zero_radius_is_invalid() {
        let mut record = sample_record();
        record.circle.r = 0.0;
        assert!(record.validate().is_err());
    }

    #[test]
    fn load_rejects_tampered_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        let record = sample_record();
        record.save(&path).unwrap();

        // corrupt the persisted count and reload
        let text = std::fs::read_to_string(&path).unwrap();
        let tampered = text.replace("\"digit_count\": 7", "\"digit_count\": 6");
        std::fs::write(&path, tampered).unwrap();
        let err = CalibrationRecord::load(&path).unwrap_err();
        assert!(matches!(err, ReaderError::CalibrationInvalid(_)));
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        let record = sample_record();
        record.save(&path).unwrap();
        assert_eq!(CalibrationRecord::load(&path).unwrap(), record);
    }
}
