//! Intensity-domain filters: median blur, binarization, morphology.
//!
//! These mirror the classical preprocessing chain ahead of the edge, line
//! and circle transforms. All filters clamp at the borders (replicate
//! border) and return a new [`Frame`].

use crate::frame::Frame;

/// Median blur with an odd square kernel (default 5 upstream). Even kernel
/// sizes are rounded up; kernel 1 is the identity.
pub fn median_blur(frame: &Frame, kernel: usize) -> Frame {
    let k = kernel | 1;
    if k <= 1 || frame.w == 0 || frame.h == 0 {
        return frame.clone();
    }
    let r = (k / 2) as isize;
    let mut out = Frame::new(frame.w, frame.h);
    let mut window = Vec::with_capacity(k * k);
    for y in 0..frame.h {
        for x in 0..frame.w {
            window.clear();
            for dy in -r..=r {
                for dx in -r..=r {
                    window.push(frame.get_clamped(x as isize + dx, y as isize + dy));
                }
            }
            window.sort_unstable();
            out.set(x, y, window[window.len() / 2]);
        }
    }
    out
}

/// Fixed-level binarization to {0, 255}. With `invert` set, pixels *below*
/// the level become foreground (used to pick dark digits off a light face).
pub fn threshold(frame: &Frame, level: u8, invert: bool) -> Frame {
    let mut out = Frame::new(frame.w, frame.h);
    for (dst, &src) in out.data.iter_mut().zip(frame.data.iter()) {
        let above = src > level;
        *dst = if above != invert { 255 } else { 0 };
    }
    out
}

/// Otsu's threshold level: maximizes between-class variance of the
/// histogram. Returns 0 for an empty frame.
pub fn otsu_level(frame: &Frame) -> u8 {
    let total = frame.data.len();
    if total == 0 {
        return 0;
    }
    let mut hist = [0u64; 256];
    for &v in &frame.data {
        hist[v as usize] += 1;
    }
    let sum_all: f64 = hist
        .iter()
        .enumerate()
        .map(|(v, &n)| v as f64 * n as f64)
        .sum();

    let mut best_level = 0u8;
    let mut best_var = -1.0f64;
    let mut weight_bg = 0.0f64;
    let mut sum_bg = 0.0f64;
    for t in 0..256 {
        weight_bg += hist[t] as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total as f64 - weight_bg;
        if weight_fg == 0.0 {
            break;
        }
        sum_bg += t as f64 * hist[t] as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;
        let var = weight_bg * weight_fg * (mean_bg - mean_fg) * (mean_bg - mean_fg);
        if var > best_var {
            best_var = var;
            best_level = t as u8;
        }
    }
    best_level
}

/// Morphological close (dilate then erode) with a square structuring
/// element, on a binary {0, 255} frame. Merges nearby brush strokes into a
/// single blob ahead of contour extraction.
pub fn morph_close(frame: &Frame, kernel: usize) -> Frame {
    let k = kernel.max(1);
    if k <= 1 {
        return frame.clone();
    }
    erode(&dilate(frame, k), k)
}

fn dilate(frame: &Frame, kernel: usize) -> Frame {
    rank_filter(frame, kernel, true)
}

fn erode(frame: &Frame, kernel: usize) -> Frame {
    rank_filter(frame, kernel, false)
}

// Square max/min filter. The structuring element is anchored at its center
// for odd kernels and half a pixel off for even ones, matching the usual
// convention.
fn rank_filter(frame: &Frame, kernel: usize, take_max: bool) -> Frame {
    let lo = -((kernel as isize - 1) / 2);
    let hi = kernel as isize / 2;
    let mut out = Frame::new(frame.w, frame.h);
    for y in 0..frame.h {
        for x in 0..frame.w {
            let mut acc: u8 = if take_max { 0 } else { 255 };
            for dy in lo..=hi {
                for dx in lo..=hi {
                    let v = frame.get_clamped(x as isize + dx, y as isize + dy);
                    acc = if take_max { acc.max(v) } else { acc.min(v) };
                }
            }
            out.set(x, y, acc);
        }
    }
    out
}
