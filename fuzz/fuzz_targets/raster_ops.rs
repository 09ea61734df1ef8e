#![no_main]

//! Drawing primitives with hostile coordinates: everything must clip,
//! nothing may panic or write outside the buffer.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rasterkit::engine::{draw_circle, draw_line, draw_rect, draw_text, fill_rect, PixelBuffer};
use rasterkit::ops::Color;

#[derive(Arbitrary, Debug)]
struct Stroke {
    kind: u8,
    a: i32,
    b: i32,
    c: i32,
    d: i32,
    thickness: i8,
    rgb: (u8, u8, u8),
    text: String,
}

#[derive(Arbitrary, Debug)]
struct Canvas {
    width: u8,
    height: u8,
    channels: u8,
    strokes: Vec<Stroke>,
}

fuzz_target!(|canvas: Canvas| {
    let w = u32::from(canvas.width) % 96 + 1;
    let h = u32::from(canvas.height) % 96 + 1;
    let channels = [1u32, 3, 4][usize::from(canvas.channels % 3)];
    let Ok(mut buf) = PixelBuffer::new(w, h, channels) else {
        return;
    };

    for s in canvas.strokes.iter().take(16) {
        // Bresenham walks every step, so keep strokes short
        let (a, b, c, d) = (s.a % 1024, s.b % 1024, s.c % 1024, s.d % 1024);
        let color = Color::rgb(s.rgb.0, s.rgb.1, s.rgb.2);
        let thickness = i32::from(s.thickness);
        match s.kind % 5 {
            0 => draw_line(&mut buf, a, b, c, d, color, thickness),
            1 => draw_rect(&mut buf, a, b, c, d, color, thickness),
            2 => fill_rect(&mut buf, s.a, s.b, s.c, s.d, color),
            3 => draw_circle(&mut buf, a, b, c, color, thickness),
            _ => draw_text(&mut buf, s.a, s.b, &s.text, color, thickness % 8),
        }
    }

    assert_eq!(buf.size_bytes(), (w * h * channels) as usize);
});
