// src/engine/raster.rs
//
// Rasterization primitives drawn in place on a PixelBuffer.
// All coordinates are integer pixels and may lie partly or wholly outside the
// buffer; out-of-bounds pixels are skipped, never an error.

use crate::engine::buffer::{luma, PixelBuffer};
use crate::ops::Color;

/// Glyph width in font cells.
pub const GLYPH_COLS: i64 = 3;
/// Glyph height in font cells.
pub const GLYPH_ROWS: usize = 5;

/// Horizontal advance per character, in font cells (glyph + 1 gap).
const ADVANCE: i64 = 4;
/// Vertical advance per newline, in font cells.
const LINE_HEIGHT: i64 = 6;

/// Digit glyphs 0-9. Each row byte is read from the most significant bit;
/// only the top `GLYPH_COLS` bits are drawn.
const DIGITS: [[u8; GLYPH_ROWS]; 10] = [
    [0x7C, 0x82, 0x82, 0x82, 0x7C],
    [0x00, 0x42, 0xFE, 0x02, 0x00],
    [0x46, 0x8A, 0x92, 0xA2, 0x42],
    [0x44, 0x82, 0x92, 0x92, 0x6C],
    [0x18, 0x28, 0x48, 0xFE, 0x08],
    [0xF4, 0x92, 0x92, 0x92, 0x8C],
    [0x3C, 0x52, 0x92, 0x92, 0x8C],
    [0x80, 0x86, 0x98, 0xA0, 0xC0],
    [0x6C, 0x92, 0x92, 0x92, 0x6C],
    [0x64, 0x92, 0x92, 0x92, 0x7C],
];

/// Write one pixel if it lies inside the buffer.
///
/// Buffers with 3+ channels receive R, G and B (alpha is untouched);
/// single-channel buffers receive the color's luma.
#[inline]
pub fn set_pixel(buf: &mut PixelBuffer, x: i64, y: i64, color: Color) {
    if !buf.contains(x, y) {
        return;
    }
    let single = buf.channels() == 1;
    let px = buf.pixel_mut(x as usize, y as usize);
    if single {
        px[0] = luma(color.r, color.g, color.b);
    } else {
        px[..3].copy_from_slice(&[color.r, color.g, color.b]);
    }
}

/// Stamp a square brush spanning `-t/2..=t/2` around (x, y), clipped to the buffer.
fn stamp(buf: &mut PixelBuffer, x: i64, y: i64, thickness: i32, color: Color) {
    let half = i64::from(thickness / 2);
    if half < 0 {
        return;
    }
    let (w, h) = (i64::from(buf.width()), i64::from(buf.height()));
    let (x0, x1) = ((x - half).max(0), (x + half).min(w - 1));
    let (y0, y1) = ((y - half).max(0), (y + half).min(h - 1));
    for py in y0..=y1 {
        for px in x0..=x1 {
            set_pixel(buf, px, py, color);
        }
    }
}

/// Bresenham line with a square brush of side `thickness` at every step.
/// Negative thickness draws nothing.
pub fn draw_line(
    buf: &mut PixelBuffer,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    color: Color,
    thickness: i32,
) {
    if thickness < 0 {
        return;
    }
    let (mut x, mut y) = (i64::from(x1), i64::from(y1));
    let (x2, y2) = (i64::from(x2), i64::from(y2));
    let dx = (x2 - x).abs();
    let dy = -(y2 - y).abs();
    let sx = if x < x2 { 1 } else { -1 };
    let sy = if y < y2 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        stamp(buf, x, y, thickness, color);
        if x == x2 && y == y2 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Rectangle outline as four lines through the corners (x, y) and (x+w, y+h).
pub fn draw_rect(
    buf: &mut PixelBuffer,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    color: Color,
    thickness: i32,
) {
    let right = x.saturating_add(width);
    let bottom = y.saturating_add(height);
    draw_line(buf, x, y, right, y, color, thickness);
    draw_line(buf, x, bottom, right, bottom, color, thickness);
    draw_line(buf, x, y, x, bottom, color, thickness);
    draw_line(buf, right, y, right, bottom, color, thickness);
}

/// Fill `[x, x+w) x [y, y+h)`, clipped to the buffer.
pub fn fill_rect(buf: &mut PixelBuffer, x: i32, y: i32, width: i32, height: i32, color: Color) {
    let (w, h) = (i64::from(buf.width()), i64::from(buf.height()));
    let x0 = i64::from(x).max(0);
    let y0 = i64::from(y).max(0);
    let x1 = (i64::from(x) + i64::from(width)).min(w);
    let y1 = (i64::from(y) + i64::from(height)).min(h);
    for py in y0..y1 {
        for px in x0..x1 {
            set_pixel(buf, px, py, color);
        }
    }
}

/// Midpoint circle with 8-way symmetry; a square brush is stamped at each
/// of the eight reflected points.
pub fn draw_circle(buf: &mut PixelBuffer, cx: i32, cy: i32, radius: i32, color: Color, thickness: i32) {
    if thickness < 0 {
        return;
    }
    let (cx, cy) = (i64::from(cx), i64::from(cy));
    let mut x = i64::from(radius);
    let mut y = 0i64;
    let mut err = 0i64;

    while x >= y {
        for (px, py) in [
            (cx + x, cy + y),
            (cx + y, cy + x),
            (cx - y, cy + x),
            (cx - x, cy + y),
            (cx - x, cy - y),
            (cx - y, cy - x),
            (cx + y, cy - x),
            (cx + x, cy - y),
        ] {
            stamp(buf, px, py, thickness, color);
        }
        y += 1;
        err += 1 + 2 * y;
        if 2 * (err - x) + 1 > 0 {
            x -= 1;
            err += 1 - 2 * x;
        }
    }
}

/// Draw one glyph with its top-left at (x, y), each font cell a
/// `scale` x `scale` block. Returns false for characters without a glyph.
pub fn draw_char(buf: &mut PixelBuffer, x: i64, y: i64, ch: char, color: Color, scale: i32) -> bool {
    let Some(glyph) = ch.to_digit(10).map(|d| &DIGITS[d as usize]) else {
        return false;
    };
    let scale = i64::from(scale);
    let (w, h) = (i64::from(buf.width()), i64::from(buf.height()));
    for (row, &bits) in glyph.iter().enumerate() {
        for col in 0..GLYPH_COLS {
            if bits & (1 << (7 - col)) == 0 {
                continue;
            }
            let ox = x + col * scale;
            let oy = y + row as i64 * scale;
            // clip the cell block to the buffer before walking it
            let (x0, x1) = (ox.max(0), (ox + scale).min(w));
            let (y0, y1) = (oy.max(0), (oy + scale).min(h));
            for py in y0..y1 {
                for px in x0..x1 {
                    set_pixel(buf, px, py, color);
                }
            }
        }
    }
    true
}

/// Draw `text` with the digit font. Only `0`-`9` render; every other
/// character still advances the cursor, and `\n` starts a new line at `x`.
pub fn draw_text(buf: &mut PixelBuffer, x: i32, y: i32, text: &str, color: Color, scale: i32) {
    let (origin_x, mut cx, mut cy) = (i64::from(x), i64::from(x), i64::from(y));
    let step = i64::from(scale);
    let mut skipped = 0usize;
    for ch in text.chars() {
        if ch == '\n' {
            cy += LINE_HEIGHT * step;
            cx = origin_x;
            continue;
        }
        if !draw_char(buf, cx, cy, ch, color, scale) && !ch.is_whitespace() {
            skipped += 1;
        }
        cx += ADVANCE * step;
    }
    if skipped > 0 {
        tracing::debug!(skipped, "characters without a glyph were not drawn");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(w: u32, h: u32, channels: u32) -> PixelBuffer {
        PixelBuffer::new(w, h, channels).unwrap()
    }

    fn lit(buf: &PixelBuffer) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for y in 0..buf.height() as usize {
            for x in 0..buf.width() as usize {
                if buf.pixel(x, y).iter().any(|&v| v != 0) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn horizontal_line_sets_exact_pixels() {
        let mut buf = canvas(20, 5, 3);
        draw_line(&mut buf, 0, 0, 10, 0, Color::RED, 1);
        let expected: Vec<_> = (0..=10).map(|x| (x, 0)).collect();
        assert_eq!(lit(&buf), expected);
        assert_eq!(buf.pixel(5, 0), &[255, 0, 0]);
    }

    #[test]
    fn thick_line_uses_square_brush() {
        let mut buf = canvas(10, 10, 1);
        draw_line(&mut buf, 5, 5, 5, 5, Color::WHITE, 3);
        assert_eq!(lit(&buf).len(), 9);
    }

    #[test]
    fn negative_thickness_draws_nothing() {
        let mut buf = canvas(10, 10, 3);
        draw_line(&mut buf, 0, 0, 9, 9, Color::RED, -1);
        draw_circle(&mut buf, 5, 5, 3, Color::RED, -2);
        assert!(lit(&buf).is_empty());
    }

    #[test]
    fn single_channel_receives_luma() {
        let mut buf = canvas(2, 2, 1);
        set_pixel(&mut buf, 1, 1, Color::GREEN);
        assert_eq!(buf.pixel(1, 1), &[149]);
    }

    #[test]
    fn alpha_is_preserved() {
        let mut buf = PixelBuffer::from_raw(1, 1, 4, vec![0, 0, 0, 77]).unwrap();
        set_pixel(&mut buf, 0, 0, Color::BLUE);
        assert_eq!(buf.pixel(0, 0), &[0, 0, 255, 77]);
    }

    #[test]
    fn out_of_bounds_is_clipped() {
        let mut buf = canvas(4, 4, 3);
        set_pixel(&mut buf, -1, 0, Color::RED);
        set_pixel(&mut buf, 4, 0, Color::RED);
        fill_rect(&mut buf, -10, -10, 12, 12, Color::RED);
        assert_eq!(lit(&buf), vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn rect_outline_spans_corners_inclusive() {
        let mut buf = canvas(10, 10, 1);
        draw_rect(&mut buf, 1, 1, 4, 3, Color::WHITE, 1);
        let pts = lit(&buf);
        assert!(pts.contains(&(1, 1)));
        assert!(pts.contains(&(5, 4)));
        assert!(!pts.contains(&(3, 2)));
        assert_eq!(pts.len(), 2 * 5 + 2 * 2);
    }

    #[test]
    fn circle_is_symmetric() {
        let mut buf = canvas(21, 21, 1);
        draw_circle(&mut buf, 10, 10, 6, Color::WHITE, 1);
        for (x, y) in lit(&buf) {
            assert!(buf.pixel(20 - x, y)[0] != 0);
            assert!(buf.pixel(x, 20 - y)[0] != 0);
            assert!(buf.pixel(y, x)[0] != 0);
        }
        assert!(buf.pixel(16, 10)[0] != 0);
        assert!(buf.pixel(10, 4)[0] != 0);
        assert_eq!(buf.pixel(10, 10)[0], 0);
    }

    #[test]
    fn digit_one_glyph() {
        let mut buf = canvas(3, 5, 1);
        assert!(draw_char(&mut buf, 0, 0, '1', Color::WHITE, 1));
        // rows 0x00,0x42,0xFE,0x02,0x00 -> top three bits: 000,010,111,000,000
        assert_eq!(lit(&buf), vec![(1, 1), (0, 2), (1, 2), (2, 2)]);
    }

    #[test]
    fn text_skips_letters_but_advances() {
        let mut digits = canvas(40, 20, 1);
        draw_text(&mut digits, 0, 0, "a7", Color::WHITE, 1);
        let mut shifted = canvas(40, 20, 1);
        draw_char(&mut shifted, 4, 0, '7', Color::WHITE, 1);
        assert_eq!(digits, shifted);
    }

    #[test]
    fn newline_resets_column() {
        let mut buf = canvas(40, 40, 1);
        draw_text(&mut buf, 2, 0, "5\n5", Color::WHITE, 2);
        let mut expected = canvas(40, 40, 1);
        draw_char(&mut expected, 2, 0, '5', Color::WHITE, 2);
        draw_char(&mut expected, 2, 12, '5', Color::WHITE, 2);
        assert_eq!(buf, expected);
    }
}
