// src/engine/edges.rs
//
// Gradient and edge maps. Both operate on luma and emit one channel.

use crate::engine::buffer::PixelBuffer;
use crate::engine::common::EngineResult;

const SOBEL_X: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
const SOBEL_Y: [[i32; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

const SMOOTH: [[f32; 5]; 5] = [
    [2.0, 4.0, 5.0, 4.0, 2.0],
    [4.0, 9.0, 12.0, 9.0, 4.0],
    [5.0, 12.0, 15.0, 12.0, 5.0],
    [4.0, 9.0, 12.0, 9.0, 4.0],
    [2.0, 4.0, 5.0, 4.0, 2.0],
];
const SMOOTH_SUM: f32 = 159.0;

/// Sobel gradient magnitude, clipped to 255. The 1px ring stays 0.
pub fn sobel(src: &PixelBuffer) -> EngineResult<PixelBuffer> {
    let gray = src.to_grayscale()?;
    let mut out = gray.blank_like()?;
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    if w < 3 || h < 3 {
        return Ok(out);
    }

    let data = gray.data();
    let dst = out.data_mut();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let (mut gx, mut gy) = (0i32, 0i32);
            for ky in 0..3 {
                for kx in 0..3 {
                    let v = i32::from(data[(y + ky - 1) * w + x + kx - 1]);
                    gx += v * SOBEL_X[ky][kx];
                    gy += v * SOBEL_Y[ky][kx];
                }
            }
            let magnitude = f64::from(gx * gx + gy * gy).sqrt() as i32;
            dst[y * w + x] = magnitude.min(255) as u8;
        }
    }
    Ok(out)
}

/// Simplified edge map: a fixed 5x5 smoothing pass followed by a single
/// global cut at `high`. `low` is accepted for signature compatibility and
/// has no effect; there is no gradient or hysteresis stage.
pub fn canny(src: &PixelBuffer, low: f32, high: f32) -> EngineResult<PixelBuffer> {
    let gray = src.to_grayscale()?;
    let mut smoothed = gray.blank_like()?;
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    tracing::debug!(low, high, "edge map");

    if w > 4 && h > 4 {
        let data = gray.data();
        let dst = smoothed.data_mut();
        for y in 2..h - 2 {
            for x in 2..w - 2 {
                let mut acc = 0.0f32;
                for (ky, row) in SMOOTH.iter().enumerate() {
                    for (kx, &k) in row.iter().enumerate() {
                        acc += f32::from(data[(y + ky - 2) * w + x + kx - 2]) * k;
                    }
                }
                dst[y * w + x] = (acc / SMOOTH_SUM) as u8;
            }
        }
    }

    for v in smoothed.data_mut() {
        *v = if f32::from(*v) > high { 255 } else { 0 };
    }
    Ok(smoothed)
}
