//! Optional debug artifact sink for offline tuning.
//!
//! An explicit object handed to the pipeline (never ambient global state).
//! When enabled it writes numbered grayscale snapshots of every stage —
//! `002_gray.png`, `003_circles.png`, `005_edges.png`, … — append-only, and
//! never required for correctness: failures are logged and swallowed.

use crate::frame::Frame;
use crate::gauge::Circle;
use crate::segment::BoundingBox;
use log::warn;
use std::cell::Cell;
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct DebugSink {
    dir: Option<PathBuf>,
    seq: Cell<u32>,
}

impl DebugSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            seq: Cell::new(1),
        }
    }

    /// Sink that drops everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// Write the next numbered snapshot, e.g. `004_crop.png`.
    pub fn save(&self, tag: &str, frame: &Frame) {
        let Some(dir) = &self.dir else { return };
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        let path = dir.join(format!("{seq:03}_{tag}.png"));
        if let Err(err) = crate::io::save_grayscale(frame, &path) {
            warn!("could not write debug artifact {}: {err}", path.display());
        }
    }

    /// Snapshot with a circle overlay drawn in.
    pub fn save_with_circle(&self, tag: &str, frame: &Frame, circle: &Circle) {
        if !self.is_enabled() {
            return;
        }
        let mut overlay = frame.clone();
        draw_circle(&mut overlay, circle, 255);
        draw_cross(&mut overlay, circle.cx, circle.cy, 255);
        self.save(tag, &overlay);
    }

    /// Snapshot with box outlines drawn in.
    pub fn save_with_boxes(&self, tag: &str, frame: &Frame, boxes: &[BoundingBox]) {
        if !self.is_enabled() {
            return;
        }
        let mut overlay = frame.clone();
        for b in boxes {
            draw_box(&mut overlay, b, 255);
        }
        self.save(tag, &overlay);
    }
}

fn put(frame: &mut Frame, x: isize, y: isize, v: u8) {
    if x >= 0 && y >= 0 && (x as usize) < frame.w && (y as usize) < frame.h {
        frame.set(x as usize, y as usize, v);
    }
}

fn draw_circle(frame: &mut Frame, circle: &Circle, v: u8) {
    // one sample per boundary pixel is plenty for an overlay
    let steps = (circle.r * std::f32::consts::TAU).ceil().max(16.0) as usize;
    for i in 0..steps {
        let t = i as f32 / steps as f32 * std::f32::consts::TAU;
        let x = (circle.cx + circle.r * t.cos()).round() as isize;
        let y = (circle.cy + circle.r * t.sin()).round() as isize;
        put(frame, x, y, v);
    }
}

fn draw_cross(frame: &mut Frame, cx: f32, cy: f32, v: u8) {
    let (cx, cy) = (cx.round() as isize, cy.round() as isize);
    for d in -3..=3 {
        put(frame, cx + d, cy, v);
        put(frame, cx, cy + d, v);
    }
}

fn draw_box(frame: &mut Frame, b: &BoundingBox, v: u8) {
    for x in b.x..b.x + b.w {
        put(frame, x as isize, b.y as isize, v);
        put(frame, x as isize, (b.y + b.h) as isize - 1, v);
    }
    for y in b.y..b.y + b.h {
        put(frame, b.x as isize, y as isize, v);
        put(frame, (b.x + b.w) as isize - 1, y as isize, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_sink_writes_nothing() {
        let sink = DebugSink::disabled();
        assert!(!sink.is_enabled());
        sink.save("gray", &Frame::new(4, 4));
    }

    #[test]
    fn snapshots_are_numbered_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DebugSink::new(dir.path());
        sink.save("gray", &Frame::new(4, 4));
        sink.save("crop", &Frame::new(4, 4));
        assert!(dir.path().join("001_gray.png").exists());
        assert!(dir.path().join("002_crop.png").exists());
    }
}
