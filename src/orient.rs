//! Rotation correction: derive the dominant line angle of the gauge
//! markings and level the crop so the digit row runs horizontal.

use crate::angle::{angular_difference, axial_mean};
use crate::edges::canny;
use crate::error::{ReaderError, Result};
use crate::filter::median_blur;
use crate::frame::Frame;
use crate::hough::{line_transform, LineVote};
use log::{debug, info};
use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

/// Knobs for the angle-finding stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AngleOptions {
    /// Median kernel applied ahead of edge detection.
    pub blur_kernel: usize,
    /// Canny hysteresis thresholds on the Sobel magnitude.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Minimum accumulator votes for a line.
    pub line_votes: u32,
}

impl Default for AngleOptions {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            canny_low: 100.0,
            canny_high: 150.0,
            line_votes: 100,
        }
    }
}

/// Detected lines plus the edge map they came from, kept for the debug sink.
#[derive(Debug)]
pub struct AngleEstimate {
    /// Axial mean of the line angles, radians in [0, π).
    pub angle_rad: f32,
    pub lines: Vec<LineVote>,
    pub edge_map: Frame,
}

/// Find the dominant line angle of the gauge markings.
///
/// Fails with [`ReaderError::NoLinesDetected`] when the line transform
/// returns nothing; a silent zero rotation would invalidate every digit box
/// downstream.
pub fn find_angle(crop: &Frame, opts: &AngleOptions) -> Result<AngleEstimate> {
    let blurred = median_blur(crop, opts.blur_kernel);
    let edge_map = canny(&blurred, opts.canny_low, opts.canny_high);
    let lines = line_transform(&edge_map, opts.line_votes);
    debug!("line transform returned {} line(s)", lines.len());

    let thetas: Vec<f32> = lines.iter().map(|l| l.theta).collect();
    let angle_rad = axial_mean(&thetas).ok_or(ReaderError::NoLinesDetected)?;
    let spread = thetas
        .iter()
        .map(|&t| angular_difference(t, angle_rad))
        .fold(0.0f32, f32::max);
    info!(
        "averaged line angle: {angle_rad:.3} rad ({} lines, max spread {spread:.3})",
        thetas.len()
    );
    Ok(AngleEstimate {
        angle_rad,
        lines,
        edge_map,
    })
}

/// The rotation (degrees, counter-clockwise) that levels a crop whose
/// dominant line angle is `angle_rad`: `180·θ/π + 90`.
#[inline]
pub fn leveling_degrees(angle_rad: f32) -> f32 {
    angle_rad.to_degrees() + 90.0
}

/// Rotate a frame by `degrees` counter-clockwise around its own center,
/// keeping the frame size. Inverse-mapped bilinear warp; samples falling
/// outside the source are black.
pub fn rotate(frame: &Frame, degrees: f32) -> Frame {
    if degrees.abs() < 1e-6 {
        return frame.clone();
    }
    let mut out = Frame::new(frame.w, frame.h);
    let center = Vector2::new(
        frame.w as f32 / 2.0 - 0.5,
        frame.h as f32 / 2.0 - 0.5,
    );
    // map each destination pixel back into the source
    let inverse = Rotation2::new(degrees.to_radians());
    for y in 0..frame.h {
        for x in 0..frame.w {
            let offset = Vector2::new(x as f32, y as f32) - center;
            let src = inverse * offset + center;
            if src.x < -0.5
                || src.y < -0.5
                || src.x > frame.w as f32 - 0.5
                || src.y > frame.h as f32 - 0.5
            {
                continue;
            }
            out.set(x, y, frame.sample_bilinear(src.x, src.y));
        }
    }
    out
}
