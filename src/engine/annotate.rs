// src/engine/annotate.rs
//
// Fixed-geometry annotation stubs.
//
// These do NOT analyse image content. Each draws the same box or lines at
// positions derived only from the image size, and reports a constant count.
// They exist so callers written against the detection surface keep working.
// Labels go through the digit-only font, so alphabetic captions draw nothing.

use crate::engine::buffer::PixelBuffer;
use crate::engine::common::EngineResult;
use crate::engine::contours::find_contours;
use crate::engine::edges::canny;
use crate::engine::raster::{draw_line, draw_rect, draw_text, set_pixel};
use crate::ops::Color;

/// Box used by the plate stubs: centered horizontally, a sixth of the
/// height tall, starting a third of the way down.
fn plate_box(buf: &PixelBuffer) -> (i32, i32, i32, i32) {
    let (w, h) = (buf.width() as i32, buf.height() as i32);
    (w / 4, h / 3, w / 2, h / 6)
}

/// Green box over the central quarter. Always reports one face.
pub fn detect_faces(src: &PixelBuffer) -> (PixelBuffer, usize) {
    let mut out = src.clone();
    let (w, h) = (src.width() as i32, src.height() as i32);
    let (x, y) = (w / 4, h / 4);
    draw_rect(&mut out, x, y, w / 2, h / 2, Color::GREEN, 3);
    draw_text(&mut out, x + 10, y - 10, "FACE", Color::GREEN, 2);
    (out, 1)
}

/// Red plate box. Always reports one plate.
pub fn detect_plate(src: &PixelBuffer) -> (PixelBuffer, usize) {
    detect_plate_outline(src, 1)
}

/// Plate box in a selectable colour: 2 green, 3 blue, 4 yellow, anything
/// else red. Always reports one plate.
pub fn detect_plate_outline(src: &PixelBuffer, color_choice: i32) -> (PixelBuffer, usize) {
    let color = match color_choice {
        2 => Color::GREEN,
        3 => Color::BLUE,
        4 => Color::YELLOW,
        _ => Color::RED,
    };
    let mut out = src.clone();
    let (x, y, w, h) = plate_box(src);
    draw_rect(&mut out, x, y, w, h, color, 3);
    draw_text(&mut out, x + 5, y - 20, "PLATE", Color::WHITE, 2);
    (out, 1)
}

/// Two horizontal green lines at y = 50 and y = 100. Always reports two.
pub fn hough_lines(src: &PixelBuffer) -> (PixelBuffer, usize) {
    let mut out = src.clone();
    draw_line(&mut out, 50, 50, 200, 50, Color::GREEN, 2);
    draw_line(&mut out, 50, 100, 200, 100, Color::GREEN, 2);
    (out, 2)
}

/// Yellow 50x50 box at (100, 100), which is also the reported match.
/// No template is consulted.
pub fn template_match(src: &PixelBuffer) -> (PixelBuffer, (i32, i32)) {
    let (x, y) = (100, 100);
    let mut out = src.clone();
    draw_rect(&mut out, x, y, 50, 50, Color::YELLOW, 2);
    draw_text(&mut out, x, y - 10, "TEMPLATE", Color::YELLOW, 1);
    (out, (x, y))
}

/// Default iteration cap for `kmeans`.
pub const DEFAULT_KMEANS_ITERS: i32 = 10;

/// Colour quantization placeholder. Neither `k` nor `max_iters` is used;
/// the result is an unmodified copy.
pub fn kmeans(src: &PixelBuffer, k: i32, max_iters: i32) -> PixelBuffer {
    tracing::debug!(k, max_iters, "kmeans copies its input");
    src.clone()
}

/// Histogram equalization placeholder. Returns an unmodified copy.
pub fn equalize_hist(src: &PixelBuffer) -> PixelBuffer {
    src.clone()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayMode {
    /// Paint edge-map pixels green.
    Edges,
    /// Outline component boxes in red.
    Contours,
    /// Draw the plate box.
    Plate,
}

impl OverlayMode {
    /// Mode codes 1..=3. Other codes select no overlay.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(OverlayMode::Edges),
            2 => Some(OverlayMode::Contours),
            3 => Some(OverlayMode::Plate),
            _ => None,
        }
    }
}

/// Annotated copy of `src`. `None` returns an unmodified copy.
pub fn overlay(src: &PixelBuffer, mode: Option<OverlayMode>) -> EngineResult<PixelBuffer> {
    let mut out = src.clone();
    match mode {
        Some(OverlayMode::Edges) => {
            let edges = canny(src, 50.0, 150.0)?;
            for y in 0..edges.height() as usize {
                for x in 0..edges.width() as usize {
                    if edges.pixel(x, y)[0] > 0 {
                        set_pixel(&mut out, x as i64, y as i64, Color::GREEN);
                    }
                }
            }
        }
        Some(OverlayMode::Contours) => {
            let edges = canny(&src.to_grayscale()?, 50.0, 150.0)?;
            for r in find_contours(&edges) {
                draw_rect(&mut out, r.x, r.y, r.width, r.height, Color::RED, 2);
            }
        }
        Some(OverlayMode::Plate) => {
            let (x, y, w, h) = plate_box(src);
            draw_rect(&mut out, x, y, w, h, Color::RED, 3);
            draw_text(&mut out, x + 10, y - 10, "PLATE", Color::YELLOW, 2);
        }
        None => {}
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> PixelBuffer {
        PixelBuffer::new(240, 120, 3).unwrap()
    }

    #[test]
    fn face_box_is_fixed() {
        let (out, count) = detect_faces(&blank());
        assert_eq!(count, 1);
        assert_eq!(out.pixel(60, 30), &[0, 255, 0]);
        assert_eq!(out.pixel(180, 90), &[0, 255, 0]);
        assert_eq!(out.pixel(120, 60), &[0, 0, 0]);
    }

    #[test]
    fn plate_colour_choice() {
        let (x, y, _, _) = plate_box(&blank());
        for (choice, color) in [(1, Color::RED), (2, Color::GREEN), (3, Color::BLUE), (4, Color::YELLOW), (9, Color::RED)] {
            let (out, count) = detect_plate_outline(&blank(), choice);
            assert_eq!(count, 1);
            assert_eq!(out.pixel(x as usize, y as usize), &[color.r, color.g, color.b]);
        }
        assert_eq!(detect_plate(&blank()).0, detect_plate_outline(&blank(), 1).0);
    }

    #[test]
    fn hough_and_template_constants() {
        let (out, lines) = hough_lines(&blank());
        assert_eq!(lines, 2);
        assert_eq!(out.pixel(120, 50), &[0, 255, 0]);
        assert_eq!(out.pixel(120, 100), &[0, 255, 0]);

        let (out, at) = template_match(&PixelBuffer::new(200, 200, 3).unwrap());
        assert_eq!(at, (100, 100));
        assert_eq!(out.pixel(150, 150), &[255, 255, 0]);
    }

    #[test]
    fn quantize_and_equalize_copy_through() {
        let data = (0..24 * 12 * 3).map(|i| (i * 7 % 256) as u8).collect();
        let src = PixelBuffer::from_raw(24, 12, 3, data).unwrap();
        assert_eq!(kmeans(&src, 4, DEFAULT_KMEANS_ITERS), src);
        assert_eq!(kmeans(&src, 0, -1), src);
        assert_eq!(equalize_hist(&src), src);
    }

    #[test]
    fn overlay_modes() {
        let src = blank();
        assert_eq!(overlay(&src, None).unwrap(), src);
        assert_eq!(overlay(&src, OverlayMode::from_code(7)).unwrap(), src);
        // blank input has no edges or components
        assert_eq!(overlay(&src, Some(OverlayMode::Edges)).unwrap(), src);
        assert_eq!(overlay(&src, Some(OverlayMode::Contours)).unwrap(), src);
        assert_ne!(overlay(&src, Some(OverlayMode::Plate)).unwrap(), src);
    }

    #[test]
    fn overlay_edges_paints_green() {
        let data = (0..40 * 40)
            .flat_map(|i| if i % 40 >= 20 { [255u8; 3] } else { [0u8; 3] })
            .collect();
        let src = PixelBuffer::from_raw(40, 40, 3, data).unwrap();
        let out = overlay(&src, Some(OverlayMode::Edges)).unwrap();
        assert_eq!(out.pixel(30, 20), &[0, 255, 0]);
        assert_eq!(out.pixel(5, 20), &[0, 0, 0]);
    }
}
