// src/engine/morphology.rs
//
// Grayscale morphology over a square structuring element.
// Only pixels whose full element fits inside the image are computed; the
// `size / 2` margin stays 0. Output is always single-channel.

use crate::engine::buffer::PixelBuffer;
use crate::engine::common::EngineResult;

pub const DEFAULT_ELEMENT_SIZE: usize = 3;

#[derive(Clone, Copy)]
enum Extremum {
    Min,
    Max,
}

fn morph(src: &PixelBuffer, size: usize, extremum: Extremum) -> EngineResult<PixelBuffer> {
    let gray = src.to_grayscale()?;
    let mut out = gray.blank_like()?;
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let half = size / 2;
    if w <= 2 * half || h <= 2 * half {
        return Ok(out);
    }

    let data = gray.data();
    let dst = out.data_mut();
    for y in half..h - half {
        for x in half..w - half {
            let window = (y - half..=y + half)
                .flat_map(|yy| &data[yy * w + x - half..=yy * w + x + half]);
            dst[y * w + x] = match extremum {
                Extremum::Min => window.copied().min(),
                Extremum::Max => window.copied().max(),
            }
            .unwrap_or(0);
        }
    }
    Ok(out)
}

/// Neighbourhood minimum.
pub fn erode(src: &PixelBuffer, size: usize) -> EngineResult<PixelBuffer> {
    morph(src, size, Extremum::Min)
}

/// Neighbourhood maximum.
pub fn dilate(src: &PixelBuffer, size: usize) -> EngineResult<PixelBuffer> {
    morph(src, size, Extremum::Max)
}

/// Erode, then dilate the eroded buffer.
pub fn open(src: &PixelBuffer, size: usize) -> EngineResult<PixelBuffer> {
    dilate(&erode(src, size)?, size)
}

/// Dilate, then erode the dilated buffer.
pub fn close(src: &PixelBuffer, size: usize) -> EngineResult<PixelBuffer> {
    erode(&dilate(src, size)?, size)
}
