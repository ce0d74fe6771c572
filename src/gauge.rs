//! Gauge localization: find the circular meter face and crop to it.

use crate::error::{ReaderError, Result};
use crate::frame::Frame;
use crate::hough::{circle_transform, CircleOptions};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// The located gauge boundary, in pixel coordinates of the full frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub cx: f32,
    pub cy: f32,
    pub r: f32,
}

/// Find the gauge circle in a blurred frame, restricted to the configured
/// radius band. Takes the highest-scoring candidate of the transform and
/// does not attempt to re-rank.
pub fn locate_gauge(blurred: &Frame, opts: &CircleOptions) -> Result<Circle> {
    info!(
        "looking for gauge circle, radius band {:.0}..{:.0}",
        opts.min_radius, opts.max_radius
    );
    let candidates = circle_transform(blurred, opts);
    debug!("circle transform returned {} candidate(s)", candidates.len());
    let best = candidates.first().ok_or(ReaderError::NoGaugeFound {
        min_radius: opts.min_radius,
        max_radius: opts.max_radius,
    })?;
    info!(
        "gauge at ({:.1}, {:.1}) r={:.1}, {} votes",
        best.cx, best.cy, best.r, best.votes
    );
    Ok(Circle {
        cx: best.cx,
        cy: best.cy,
        r: best.r,
    })
}

/// Crop the axis-aligned square window `[c−r, c+r]` around the circle.
/// Deterministic: the same circle on the same frame always yields
/// byte-identical output. Fails when the window leaves the frame.
pub fn crop_to_circle(frame: &Frame, circle: &Circle) -> Result<Frame> {
    let r = circle.r.round() as i64;
    let x0 = circle.cx.round() as i64 - r;
    let y0 = circle.cy.round() as i64 - r;
    let side = 2 * r;
    if r <= 0
        || x0 < 0
        || y0 < 0
        || x0 + side > frame.w as i64
        || y0 + side > frame.h as i64
    {
        return Err(ReaderError::CropOutOfBounds {
            cx: circle.cx,
            cy: circle.cy,
            r: circle.r,
            width: frame.w,
            height: frame.h,
        });
    }
    frame.crop(x0 as usize, y0 as usize, side as usize, side as usize)
}
