//! Sobel gradients and a Canny-style edge detector.
//!
//! The gradient field feeds the circle transform (votes are cast along the
//! gradient direction) and the binary edge map feeds the straight-line
//! transform used for rotation correction.

use crate::frame::Frame;

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Per-pixel gradient field of a frame.
#[derive(Clone, Debug)]
pub struct Grad {
    pub w: usize,
    pub h: usize,
    pub gx: Vec<f32>,
    pub gy: Vec<f32>,
    pub mag: Vec<f32>,
}

impl Grad {
    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }
}

/// Sobel gradients with replicate-border sampling.
pub fn sobel_gradients(frame: &Frame) -> Grad {
    let w = frame.w;
    let h = frame.h;
    let mut gx = vec![0.0f32; w * h];
    let mut gy = vec![0.0f32; w * h];
    let mut mag = vec![0.0f32; w * h];
    if w == 0 || h == 0 {
        return Grad { w, h, gx, gy, mag };
    }

    for y in 0..h {
        let y_idx = [
            y.saturating_sub(1) as isize,
            y as isize,
            (y + 1).min(h - 1) as isize,
        ];
        for x in 0..w {
            let x_idx = [
                x.saturating_sub(1) as isize,
                x as isize,
                (x + 1).min(w - 1) as isize,
            ];

            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            for (ky, &yy) in y_idx.iter().enumerate() {
                for (kx, &xx) in x_idx.iter().enumerate() {
                    let sample = frame.get_clamped(xx, yy) as f32;
                    sum_x += sample * SOBEL_KERNEL_X[ky][kx];
                    sum_y += sample * SOBEL_KERNEL_Y[ky][kx];
                }
            }

            let i = y * w + x;
            gx[i] = sum_x;
            gy[i] = sum_y;
            mag[i] = (sum_x * sum_x + sum_y * sum_y).sqrt();
        }
    }

    Grad { w, h, gx, gy, mag }
}

/// Canny-style edge detector: Sobel gradients, 4-direction non-maximum
/// suppression, then two-threshold hysteresis. Returns a binary {0, 255}
/// edge map. `low` and `high` act on the Sobel magnitude (which reaches
/// ~1443 for 8-bit input).
pub fn canny(frame: &Frame, low: f32, high: f32) -> Frame {
    let grad = sobel_gradients(frame);
    let w = frame.w;
    let h = frame.h;
    let mut out = Frame::new(w, h);
    if w < 3 || h < 3 {
        return out;
    }

    // 0 = suppressed, 1 = weak, 2 = strong
    let mut class = vec![0u8; w * h];
    let mut strong: Vec<(usize, usize)> = Vec::new();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let i = grad.idx(x, y);
            let mag = grad.mag[i];
            if mag < low {
                continue;
            }

            let mut angle_deg = grad.gy[i].atan2(grad.gx[i]).to_degrees();
            if angle_deg < 0.0 {
                angle_deg += 180.0;
            }
            let (n1x, n1y, n2x, n2y) = if !(22.5..157.5).contains(&angle_deg) {
                (x - 1, y, x + 1, y)
            } else if angle_deg < 67.5 {
                (x + 1, y - 1, x - 1, y + 1)
            } else if angle_deg < 112.5 {
                (x, y - 1, x, y + 1)
            } else {
                (x - 1, y - 1, x + 1, y + 1)
            };
            if mag < grad.mag[grad.idx(n1x, n1y)] || mag < grad.mag[grad.idx(n2x, n2y)] {
                continue;
            }

            if mag >= high {
                class[i] = 2;
                strong.push((x, y));
            } else {
                class[i] = 1;
            }
        }
    }

    // hysteresis: weak pixels survive only when 8-connected to a strong one
    let mut stack = strong;
    while let Some((x, y)) = stack.pop() {
        out.set(x, y, 255);
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                let ni = ny * w + nx;
                if class[ni] == 1 && out.get(nx, ny) == 0 {
                    class[ni] = 2;
                    stack.push((nx, ny));
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_frame() -> Frame {
        // left half dark, right half bright: a single vertical edge
        let mut f = Frame::new(16, 16);
        for y in 0..16 {
            for x in 8..16 {
                f.set(x, y, 255);
            }
        }
        f
    }

    #[test]
    fn sobel_peaks_on_the_step() {
        let grad = sobel_gradients(&step_frame());
        let on_edge = grad.mag[grad.idx(8, 8)];
        let off_edge = grad.mag[grad.idx(2, 8)];
        assert!(on_edge > 500.0, "edge magnitude {on_edge}");
        assert_eq!(off_edge, 0.0);
    }

    #[test]
    fn canny_marks_the_step_and_nothing_else() {
        let edges = canny(&step_frame(), 100.0, 300.0);
        let hits: usize = edges.data.iter().filter(|&&v| v == 255).count();
        assert!(hits > 0, "expected edge responses on the step");
        // all responses hug the step column
        for y in 0..16 {
            for x in 0..16 {
                if edges.get(x, y) == 255 {
                    assert!((7..=9).contains(&x), "stray edge at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn canny_is_silent_on_flat_input() {
        let f = Frame::from_raw(12, 12, vec![128; 144]).unwrap();
        let edges = canny(&f, 50.0, 100.0);
        assert!(edges.data.iter().all(|&v| v == 0));
    }
}
