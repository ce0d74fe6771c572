//! Synthetic meter imagery for the integration tests: seven-segment digit
//! rasters and a simple gauge face with a dark digit band.

use gauge_reader::frame::Frame;
use gauge_reader::segment::GLYPH_SIZE;

/// Segment masks per digit, bit order ABCDEFG (bit 6 = A, top bar).
const SEGMENTS: [u8; 10] = [
    0b111_1110, // 0
    0b011_0000, // 1
    0b110_1101, // 2
    0b111_1001, // 3
    0b011_0011, // 4
    0b101_1011, // 5
    0b101_1111, // 6
    0b111_0000, // 7
    0b111_1111, // 8
    0b111_1011, // 9
];

pub fn fill_rect(frame: &mut Frame, x: usize, y: usize, w: usize, h: usize, v: u8) {
    for yy in y..(y + h).min(frame.h) {
        for xx in x..(x + w).min(frame.w) {
            frame.set(xx, yy, v);
        }
    }
}

/// A white seven-segment digit on a black 30x30 raster, the exact size the
/// classifiers consume.
pub fn digit_glyph(digit: u8) -> Frame {
    assert!(digit < 10, "not a digit: {digit}");
    let mask = SEGMENTS[digit as usize];
    let mut f = Frame::new(GLYPH_SIZE, GLYPH_SIZE);
    // horizontal bars: A top, G middle, D bottom
    if mask & 0b100_0000 != 0 {
        fill_rect(&mut f, 5, 3, 20, 4, 255);
    }
    if mask & 0b000_0001 != 0 {
        fill_rect(&mut f, 5, 13, 20, 4, 255);
    }
    if mask & 0b000_1000 != 0 {
        fill_rect(&mut f, 5, 23, 20, 4, 255);
    }
    // vertical bars: F top-left, B top-right, E bottom-left, C bottom-right
    if mask & 0b000_0010 != 0 {
        fill_rect(&mut f, 3, 3, 4, 14, 255);
    }
    if mask & 0b010_0000 != 0 {
        fill_rect(&mut f, 23, 3, 4, 14, 255);
    }
    if mask & 0b000_0100 != 0 {
        fill_rect(&mut f, 3, 13, 4, 14, 255);
    }
    if mask & 0b001_0000 != 0 {
        fill_rect(&mut f, 23, 13, 4, 14, 255);
    }
    f
}

/// Copy `src` into `dst` with its top-left corner at `(x, y)`.
pub fn blit(dst: &mut Frame, src: &Frame, x: usize, y: usize) {
    for sy in 0..src.h {
        for sx in 0..src.w {
            dst.set(x + sx, y + sy, src.get(sx, sy));
        }
    }
}

/// A bright gauge face disk on a dark background.
pub fn gauge_face(size: usize, cx: usize, cy: usize, r: usize) -> Frame {
    let mut f = Frame::from_raw(size, size, vec![10; size * size]).unwrap();
    let r2 = (r * r) as i64;
    for y in 0..size {
        for x in 0..size {
            let dx = x as i64 - cx as i64;
            let dy = y as i64 - cy as i64;
            if dx * dx + dy * dy <= r2 {
                f.set(x, y, 220);
            }
        }
    }
    f
}
