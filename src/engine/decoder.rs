// src/engine/decoder.rs
//
// Decoder operations: path/bytes -> PixelBuffer via the image crate.
// Decoded layouts are normalized to 1, 3 or 4 interleaved 8-bit channels.

use crate::engine::buffer::PixelBuffer;
use crate::engine::{MAX_DIMENSION, MAX_PIXELS};
use crate::error::RasterError;
use image::{ColorType, DynamicImage, ImageReader};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::Path;

// Type alias for Result - always use RasterError to preserve error taxonomy
type DecoderResult<T> = std::result::Result<T, RasterError>;

/// Reject images whose dimensions exceed the security limits.
pub fn check_dimensions(width: u32, height: u32) -> DecoderResult<()> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(RasterError::dimension_exceeds_limit(
            u64::from(width.max(height)),
            MAX_DIMENSION,
        ));
    }
    let pixels = u64::from(width) * u64::from(height);
    if pixels > MAX_PIXELS {
        return Err(RasterError::pixel_count_exceeds_limit(pixels, MAX_PIXELS));
    }
    Ok(())
}

/// Decode the image at `path`, guessing the format from its content.
pub fn decode_path(path: &Path) -> DecoderResult<PixelBuffer> {
    let display = path.to_string_lossy().to_string();
    let open = |path: &Path| {
        File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RasterError::file_not_found(display.clone())
            } else {
                RasterError::file_read_failed(display.clone(), e)
            }
        })
    };

    if let Some((width, height)) = probe_dimensions(BufReader::new(open(path)?)) {
        check_dimensions(width, height)?;
    }

    let img = ImageReader::new(BufReader::new(open(path)?))
        .with_guessed_format()
        .map_err(|e| RasterError::file_read_failed(display.clone(), e))?
        .decode()
        .map_err(|e| RasterError::decode_failed(format!("{display}: {e}")))?;
    into_pixel_buffer(img, display)
}

/// Decode an in-memory encoded image.
pub fn decode_bytes(data: &[u8]) -> DecoderResult<PixelBuffer> {
    if let Some((width, height)) = probe_dimensions(Cursor::new(data)) {
        check_dimensions(width, height)?;
    }
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| RasterError::decode_failed(format!("failed to read image header: {e}")))?
        .decode()
        .map_err(|e| RasterError::decode_failed(format!("decode failed: {e}")))?;
    into_pixel_buffer(img, "<memory>".to_string())
}

/// Header-only dimension probe, so oversized inputs are refused before
/// the full decode allocates.
fn probe_dimensions<R: BufRead + Seek>(reader: R) -> Option<(u32, u32)> {
    ImageReader::new(reader)
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

fn into_pixel_buffer(img: DynamicImage, display: String) -> DecoderResult<PixelBuffer> {
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(RasterError::empty_image(display));
    }
    check_dimensions(width, height)?;

    let (channels, raw) = match img.color() {
        ColorType::L8 | ColorType::L16 => (1, img.into_luma8().into_raw()),
        ColorType::Rgb8 => (3, img.into_rgb8().into_raw()),
        color if color.has_alpha() => (4, img.into_rgba8().into_raw()),
        _ => (3, img.into_rgb8().into_raw()),
    };
    if raw.is_empty() {
        return Err(RasterError::empty_image(display));
    }
    PixelBuffer::from_raw(width, height, channels, raw)
}
