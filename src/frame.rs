//! Owned single-channel 8-bit raster in row-major layout (stride == width).
//!
//! The pipeline is functional: every stage consumes a `Frame` and produces a
//! new one, nothing is mutated in place once a stage has finished.

use crate::error::{ReaderError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Frame width in pixels
    pub w: usize,
    /// Frame height in pixels
    pub h: usize,
    /// Backing storage in row-major order, one byte per pixel
    pub data: Vec<u8>,
}

impl Frame {
    /// Construct a zero-initialized frame of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0; w * h],
        }
    }

    /// Construct a frame from raw grayscale bytes. Returns `None` when the
    /// buffer length does not match `w * h`.
    pub fn from_raw(w: usize, h: usize, data: Vec<u8>) -> Option<Self> {
        (data.len() == w * h).then_some(Self { w, h, data })
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    #[inline]
    /// Get the pixel value at (x, y).
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[self.idx(x, y)]
    }

    #[inline]
    /// Get the pixel value at (x, y), clamping coordinates to the frame.
    pub fn get_clamped(&self, x: isize, y: isize) -> u8 {
        let cx = x.clamp(0, self.w as isize - 1) as usize;
        let cy = y.clamp(0, self.h as isize - 1) as usize;
        self.get(cx, cy)
    }

    #[inline]
    /// Set the pixel value at (x, y).
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    #[inline]
    /// Borrow a single row.
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }

    /// Extract the axis-aligned sub-frame `[x, x+w) × [y, y+h)`.
    /// Fails when the window extends past the frame edges.
    pub fn crop(&self, x: usize, y: usize, w: usize, h: usize) -> Result<Frame> {
        if x + w > self.w || y + h > self.h || w == 0 || h == 0 {
            return Err(ReaderError::CropOutOfBounds {
                cx: x as f32 + w as f32 / 2.0,
                cy: y as f32 + h as f32 / 2.0,
                r: (w.max(h) as f32) / 2.0,
                width: self.w,
                height: self.h,
            });
        }
        let mut out = Frame::new(w, h);
        for row in 0..h {
            let src = (y + row) * self.w + x;
            let dst = row * w;
            out.data[dst..dst + w].copy_from_slice(&self.data[src..src + w]);
        }
        Ok(out)
    }

    /// Bilinear resize to `nw × nh`. A same-size resize is an exact copy.
    pub fn resize(&self, nw: usize, nh: usize) -> Frame {
        if nw == self.w && nh == self.h {
            return self.clone();
        }
        let mut out = Frame::new(nw, nh);
        if self.w == 0 || self.h == 0 || nw == 0 || nh == 0 {
            return out;
        }
        let sx = self.w as f32 / nw as f32;
        let sy = self.h as f32 / nh as f32;
        for y in 0..nh {
            // sample at pixel centers
            let fy = ((y as f32 + 0.5) * sy - 0.5).max(0.0);
            for x in 0..nw {
                let fx = ((x as f32 + 0.5) * sx - 0.5).max(0.0);
                out.set(x, y, self.sample_bilinear(fx, fy));
            }
        }
        out
    }

    /// Bilinear sample at fractional coordinates, clamping at the borders.
    #[inline]
    pub fn sample_bilinear(&self, fx: f32, fy: f32) -> u8 {
        let x0 = fx.floor() as isize;
        let y0 = fy.floor() as isize;
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;
        let p00 = self.get_clamped(x0, y0) as f32;
        let p10 = self.get_clamped(x0 + 1, y0) as f32;
        let p01 = self.get_clamped(x0, y0 + 1) as f32;
        let p11 = self.get_clamped(x0 + 1, y0 + 1) as f32;
        let top = p00 + (p10 - p00) * tx;
        let bot = p01 + (p11 - p01) * tx;
        (top + (bot - top) * ty).round().clamp(0.0, 255.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_extracts_expected_window() {
        let mut f = Frame::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                f.set(x, y, (y * 4 + x) as u8);
            }
        }
        let c = f.crop(1, 1, 2, 2).unwrap();
        assert_eq!(c.data, vec![5, 6, 9, 10]);
    }

    #[test]
    fn crop_out_of_bounds_fails() {
        let f = Frame::new(4, 4);
        assert!(f.crop(3, 3, 2, 2).is_err());
    }

    #[test]
    fn same_size_resize_is_identity() {
        let f = Frame::from_raw(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(f.resize(3, 2).data, f.data);
    }

    #[test]
    fn resize_preserves_constant_image() {
        let f = Frame::from_raw(8, 8, vec![77; 64]).unwrap();
        let r = f.resize(30, 30);
        assert!(r.data.iter().all(|&v| v == 77));
    }
}
