//! Digit segmentation: isolate the seven digit glyphs from the leveled crop.
//!
//! Two interchangeable strategies, selected by configuration:
//!
//! - **Dynamic** — contour-driven. Finds the digit row (dark band with a
//!   wide aspect ratio below a minimum vertical offset), then the individual
//!   digit blobs inside it, sorted left to right.
//! - **Static** — crops the boxes frozen in the calibration record, no
//!   detection at all. Used once geometry is trusted.

use crate::error::{ReaderError, Result};
use crate::filter::{median_blur, morph_close, otsu_level, threshold};
use crate::frame::Frame;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Glyph side length consumed by the classifiers.
pub const GLYPH_SIZE: usize = 30;

/// Axis-aligned box in the coordinate space of the leveled crop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl BoundingBox {
    /// Split the box into `n` equal-width boxes, left to right. Used when
    /// deriving per-digit boxes from a calibrated digit-row box.
    pub fn split_columns(&self, n: usize) -> Vec<BoundingBox> {
        if n == 0 {
            return Vec::new();
        }
        let step = self.w / n;
        (0..n)
            .map(|i| BoundingBox {
                x: self.x + i * step,
                y: self.y,
                w: step,
                h: self.h,
            })
            .collect()
    }
}

/// A fixed-size normalized digit raster, the unit the classifiers consume.
#[derive(Clone, Debug)]
pub struct Glyph {
    pub raster: Frame,
}

impl Glyph {
    /// Normalize an arbitrary sub-frame into a glyph.
    pub fn from_frame(sub: &Frame) -> Self {
        Self {
            raster: sub.resize(GLYPH_SIZE, GLYPH_SIZE),
        }
    }

    /// The flattened pixel vector (length `GLYPH_SIZE²`).
    pub fn vector(&self) -> &[u8] {
        &self.raster.data
    }
}

/// Knobs for the dynamic (contour-based) strategy.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentOptions {
    /// Median kernel ahead of the digit-row threshold.
    pub row_blur_kernel: usize,
    /// Fixed inverse threshold isolating the dark digit band.
    pub row_threshold: u8,
    /// Close kernel merging the band into one blob.
    pub row_close_kernel: usize,
    /// Minimum width/height ratio for the digit row.
    pub min_row_ratio: f32,
    /// Minimum vertical offset of the row, rejects clutter near the rim.
    pub min_row_offset: usize,
    /// Close kernel merging brush strokes of a single digit.
    pub digit_close_kernel: usize,
    /// Minimum blob height for a digit inside the row.
    pub min_digit_height: usize,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            row_blur_kernel: 11,
            row_threshold: 60,
            row_close_kernel: 20,
            min_row_ratio: 5.0,
            min_row_offset: 50,
            digit_close_kernel: 2,
            min_digit_height: 17,
        }
    }
}

/// Segmentation strategy, an explicit tagged choice made at startup.
#[derive(Clone, Debug)]
pub enum Segmenter {
    /// Contour detection on every cycle.
    Dynamic(SegmentOptions),
    /// Fixed boxes from the calibration record.
    Static { boxes: Vec<BoundingBox> },
}

impl Segmenter {
    /// Extract exactly `expected` glyphs from the leveled crop, ordered left
    /// to right. Fails with [`ReaderError::DigitCountMismatch`] otherwise —
    /// never truncates or pads.
    pub fn segment(&self, leveled: &Frame, expected: usize) -> Result<Vec<Glyph>> {
        let glyphs = match self {
            Segmenter::Dynamic(opts) => segment_dynamic(leveled, opts)?,
            Segmenter::Static { boxes } => segment_static(leveled, boxes)?,
        };
        if glyphs.len() != expected {
            return Err(ReaderError::DigitCountMismatch {
                expected,
                found: glyphs.len(),
            });
        }
        Ok(glyphs)
    }
}

fn segment_static(leveled: &Frame, boxes: &[BoundingBox]) -> Result<Vec<Glyph>> {
    boxes
        .iter()
        .map(|b| leveled.crop(b.x, b.y, b.w, b.h).map(|sub| Glyph::from_frame(&sub)))
        .collect()
}

fn segment_dynamic(leveled: &Frame, opts: &SegmentOptions) -> Result<Vec<Glyph>> {
    let row = detect_digit_row(leveled, opts)?;
    let row_crop = leveled.crop(row.x, row.y, row.w, row.h)?;

    // Otsu binarization plus a small close to fuse broken strokes; the
    // glyphs are cut from this binary image, matching the training corpus.
    let level = otsu_level(&row_crop);
    let binary = morph_close(&threshold(&row_crop, level, false), opts.digit_close_kernel);
    let boxes = detect_digits_in_row(&binary, opts);
    debug!("found {} digit blob(s) in the row", boxes.len());

    boxes
        .iter()
        .map(|b| binary.crop(b.x, b.y, b.w, b.h).map(|sub| Glyph::from_frame(&sub)))
        .collect()
}

/// Locate the digit-row band in a leveled crop. Shared by the dynamic
/// segmenter and the calibration tool. When several bands qualify, the
/// widest wins.
pub fn detect_digit_row(leveled: &Frame, opts: &SegmentOptions) -> Result<BoundingBox> {
    let blurred = median_blur(leveled, opts.row_blur_kernel);
    let dark = threshold(&blurred, opts.row_threshold, true);
    let merged = morph_close(&dark, opts.row_close_kernel);
    let row = component_boxes(&merged)
        .into_iter()
        .filter(|b| {
            b.h > 0 && b.w as f32 / b.h as f32 > opts.min_row_ratio && b.y > opts.min_row_offset
        })
        .max_by_key(|b| b.w);
    match row {
        Some(b) => {
            info!("digit row at [{}, {}, {}, {}]", b.x, b.y, b.w, b.h);
            Ok(b)
        }
        None => Err(ReaderError::DigitCountMismatch {
            expected: 1,
            found: 0,
        }),
    }
}

// Digit blobs inside the binarized row: external components filtered by
// height, sorted left to right.
fn detect_digits_in_row(binary: &Frame, opts: &SegmentOptions) -> Vec<BoundingBox> {
    let mut boxes: Vec<BoundingBox> = component_boxes(binary)
        .into_iter()
        .filter(|b| b.h > opts.min_digit_height)
        .collect();
    boxes.sort_by_key(|b| b.x);
    boxes
}

/// Bounding boxes of the 8-connected foreground components of a binary
/// frame — the equivalent of external contour extraction.
pub fn component_boxes(binary: &Frame) -> Vec<BoundingBox> {
    let w = binary.w;
    let h = binary.h;
    let mut visited = vec![false; w * h];
    let mut boxes = Vec::new();
    let mut stack = Vec::new();

    for start in 0..w * h {
        if visited[start] || binary.data[start] == 0 {
            continue;
        }
        let (mut min_x, mut min_y) = (w, h);
        let (mut max_x, mut max_y) = (0usize, 0usize);
        visited[start] = true;
        stack.push(start);
        while let Some(i) = stack.pop() {
            let (x, y) = (i % w, i / w);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    let nx = x as isize + dx;
                    let ny = y as isize + dy;
                    if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                        continue;
                    }
                    let ni = ny as usize * w + nx as usize;
                    if !visited[ni] && binary.data[ni] != 0 {
                        visited[ni] = true;
                        stack.push(ni);
                    }
                }
            }
        }
        boxes.push(BoundingBox {
            x: min_x,
            y: min_y,
            w: max_x - min_x + 1,
            h: max_y - min_y + 1,
        });
    }
    boxes
}
