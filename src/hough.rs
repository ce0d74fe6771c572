//! Hough-style voting transforms: circles over a radius band, and straight
//! lines in (ρ, θ) normal form.
//!
//! The circle transform follows the gradient-voting scheme: every strong
//! edge pixel casts votes along its gradient direction at every radius in
//! the band, in both polarities. Centers collect votes in a decimated
//! accumulator; the radius of each surviving center is recovered from the
//! distance histogram of the edge pixels.

use crate::edges::sobel_gradients;
use crate::frame::Frame;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Knobs for the circle transform.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleOptions {
    /// Inclusive radius band in pixels.
    pub min_radius: f32,
    pub max_radius: f32,
    /// Sobel magnitude below which a pixel casts no votes.
    pub mag_threshold: f32,
    /// Minimum votes for a center candidate, summed over a 3x3 cell
    /// neighbourhood of the accumulator.
    pub min_votes: u32,
    /// Accumulator decimation factor (1 = full resolution).
    pub accumulator_scale: usize,
    /// Cap on returned candidates, strongest first.
    pub max_candidates: usize,
}

impl Default for CircleOptions {
    fn default() -> Self {
        Self {
            min_radius: 200.0,
            max_radius: 300.0,
            mag_threshold: 300.0,
            min_votes: 120,
            accumulator_scale: 2,
            max_candidates: 8,
        }
    }
}

/// A circle-center hypothesis with its accumulator support.
#[derive(Clone, Copy, Debug)]
pub struct CircleCandidate {
    pub cx: f32,
    pub cy: f32,
    pub r: f32,
    pub votes: u32,
}

struct EdgeSample {
    x: f32,
    y: f32,
    ux: f32,
    uy: f32,
}

/// Run the circle transform. Returns candidates sorted by votes, strongest
/// first; an empty vector means no circle cleared `min_votes`.
pub fn circle_transform(frame: &Frame, opts: &CircleOptions) -> Vec<CircleCandidate> {
    let w = frame.w;
    let h = frame.h;
    if w == 0 || h == 0 || opts.min_radius <= 0.0 || opts.max_radius < opts.min_radius {
        return Vec::new();
    }
    let grad = sobel_gradients(frame);

    // gather voting pixels with their unit gradient directions
    let edges: Vec<EdgeSample> = (0..h)
        .into_par_iter()
        .flat_map_iter(|y| {
            let grad = &grad;
            let threshold = opts.mag_threshold;
            (0..w).filter_map(move |x| {
                let i = grad.idx(x, y);
                let mag = grad.mag[i];
                (mag >= threshold).then(|| EdgeSample {
                    x: x as f32,
                    y: y as f32,
                    ux: grad.gx[i] / mag,
                    uy: grad.gy[i] / mag,
                })
            })
        })
        .collect();
    if edges.is_empty() {
        return Vec::new();
    }

    let scale = opts.accumulator_scale.max(1);
    let aw = w / scale + 1;
    let ah = h / scale + 1;
    let mut acc = vec![0u32; aw * ah];

    let r_lo = opts.min_radius.round() as i32;
    let r_hi = opts.max_radius.round() as i32;
    for e in &edges {
        for r in r_lo..=r_hi {
            let r = r as f32;
            for sign in [-1.0f32, 1.0] {
                let cx = e.x + sign * r * e.ux;
                let cy = e.y + sign * r * e.uy;
                if cx < 0.0 || cy < 0.0 || cx >= w as f32 || cy >= h as f32 {
                    continue;
                }
                let ax = cx as usize / scale;
                let ay = cy as usize / scale;
                acc[ay * aw + ax] += 1;
            }
        }
    }

    // the quantized gradient directions of a rasterized arc scatter the
    // center support across adjacent cells; pool 3x3 neighbourhoods before
    // gating on votes so a clean circle still clears the threshold
    let pooled: Vec<u32> = (0..aw * ah)
        .map(|i| {
            neighbourhood(aw, ah, i % aw, i / aw)
                .map(|(nx, ny)| acc[ny * aw + nx])
                .sum()
        })
        .collect();

    // peak cells, suppressing neighbours of already-taken peaks
    let mut peaks: Vec<(usize, usize, u32)> = pooled
        .iter()
        .enumerate()
        .filter(|(_, &v)| v >= opts.min_votes)
        .map(|(i, &v)| (i % aw, i / aw, v))
        .collect();
    peaks.sort_by(|a, b| b.2.cmp(&a.2));

    let suppress = (opts.min_radius as usize / scale).max(2);
    let mut taken: Vec<(usize, usize)> = Vec::new();
    let mut out = Vec::new();
    for (ax, ay, votes) in peaks {
        if out.len() >= opts.max_candidates {
            break;
        }
        if taken
            .iter()
            .any(|&(tx, ty)| ax.abs_diff(tx) < suppress && ay.abs_diff(ty) < suppress)
        {
            continue;
        }
        taken.push((ax, ay));
        // vote-weighted centroid of the raw cells sharpens the center
        let (mut wsum, mut xsum, mut ysum) = (0.0f32, 0.0f32, 0.0f32);
        for (nx, ny) in neighbourhood(aw, ah, ax, ay) {
            let v = acc[ny * aw + nx] as f32;
            wsum += v;
            xsum += ((nx * scale) as f32 + scale as f32 / 2.0) * v;
            ysum += ((ny * scale) as f32 + scale as f32 / 2.0) * v;
        }
        let (cx, cy) = if wsum > 0.0 {
            (xsum / wsum, ysum / wsum)
        } else {
            (
                (ax * scale) as f32 + scale as f32 / 2.0,
                (ay * scale) as f32 + scale as f32 / 2.0,
            )
        };
        let r = estimate_radius(&edges, cx, cy, opts.min_radius, opts.max_radius);
        out.push(CircleCandidate { cx, cy, r, votes });
    }
    out
}

fn neighbourhood(
    aw: usize,
    ah: usize,
    ax: usize,
    ay: usize,
) -> impl Iterator<Item = (usize, usize)> {
    (ay.saturating_sub(1)..=(ay + 1).min(ah - 1)).flat_map(move |ny| {
        (ax.saturating_sub(1)..=(ax + 1).min(aw - 1)).map(move |nx| (nx, ny))
    })
}

// Mode of the edge-pixel distance histogram inside the radius band.
fn estimate_radius(edges: &[EdgeSample], cx: f32, cy: f32, min_r: f32, max_r: f32) -> f32 {
    let bins = (max_r - min_r).round() as usize + 1;
    let mut hist = vec![0u32; bins];
    for e in edges {
        let d = ((e.x - cx).powi(2) + (e.y - cy).powi(2)).sqrt();
        if d >= min_r && d <= max_r {
            hist[(d - min_r) as usize] += 1;
        }
    }
    let best = hist
        .iter()
        .enumerate()
        .max_by_key(|(_, &n)| n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    min_r + best as f32 + 0.5
}

/// A detected line in normal form `x·cosθ + y·sinθ = ρ`.
#[derive(Clone, Copy, Debug)]
pub struct LineVote {
    /// Orientation in radians, [0, π).
    pub theta: f32,
    /// Signed distance from the origin in pixels.
    pub rho: f32,
    pub votes: u32,
}

/// Straight-line transform over a binary edge map with 1° θ resolution and
/// 1 px ρ resolution. Returns every accumulator cell clearing
/// `votes_threshold`; an empty vector means no line was found.
pub fn line_transform(edge_map: &Frame, votes_threshold: u32) -> Vec<LineVote> {
    let w = edge_map.w;
    let h = edge_map.h;
    if w == 0 || h == 0 {
        return Vec::new();
    }
    const THETA_BINS: usize = 180;
    let diag = ((w * w + h * h) as f32).sqrt().ceil() as i32;
    let rho_bins = (2 * diag + 1) as usize;

    let trig: Vec<(f32, f32)> = (0..THETA_BINS)
        .map(|t| {
            let theta = t as f32 * std::f32::consts::PI / THETA_BINS as f32;
            (theta.cos(), theta.sin())
        })
        .collect();

    let mut acc = vec![0u32; THETA_BINS * rho_bins];
    for y in 0..h {
        for x in 0..w {
            if edge_map.get(x, y) == 0 {
                continue;
            }
            for (t, &(cos_t, sin_t)) in trig.iter().enumerate() {
                let rho = x as f32 * cos_t + y as f32 * sin_t;
                let bin = (rho.round() as i32 + diag) as usize;
                acc[t * rho_bins + bin] += 1;
            }
        }
    }

    let mut lines = Vec::new();
    for (t, chunk) in acc.chunks(rho_bins).enumerate() {
        for (b, &votes) in chunk.iter().enumerate() {
            if votes >= votes_threshold {
                lines.push(LineVote {
                    theta: t as f32 * std::f32::consts::PI / THETA_BINS as f32,
                    rho: (b as i32 - diag) as f32,
                    votes,
                });
            }
        }
    }
    lines
}
