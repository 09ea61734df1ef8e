// src/engine/encoder.rs
//
// Encoder operations: PixelBuffer -> JPEG / PNG / BMP bytes via the image crate.
// The whole file is encoded in memory and written to disk in one call.

use crate::engine::buffer::PixelBuffer;
use crate::engine::common::run_with_panic_policy;
use crate::error::RasterError;
use crate::ops::OutputFormat;
use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::borrow::Cow;
use std::path::Path;

// Type alias for Result - always use RasterError to preserve error taxonomy
type EncoderResult<T> = std::result::Result<T, RasterError>;

fn color_type(channels: usize) -> ExtendedColorType {
    match channels {
        1 => ExtendedColorType::L8,
        4 => ExtendedColorType::Rgba8,
        _ => ExtendedColorType::Rgb8,
    }
}

/// JPEG has no alpha plane; 4-channel input is flattened to RGB by
/// dropping the fourth byte of every pixel.
fn jpeg_payload(buf: &PixelBuffer) -> Cow<'_, [u8]> {
    if buf.channels() != 4 {
        return Cow::Borrowed(buf.data());
    }
    let mut rgb = Vec::with_capacity(buf.width() as usize * buf.height() as usize * 3);
    for px in buf.data().chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    Cow::Owned(rgb)
}

/// Encode `buf` into an in-memory file of the requested format.
pub fn encode_to_vec(buf: &PixelBuffer, format: OutputFormat) -> EncoderResult<Vec<u8>> {
    run_with_panic_policy("encode", || {
        let (width, height) = (buf.width(), buf.height());
        let mut out = Vec::new();
        let result = match format {
            OutputFormat::Jpeg { quality } => {
                let payload = jpeg_payload(buf);
                let channels = if buf.channels() == 4 { 3 } else { buf.channels() };
                JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).write_image(
                    &payload,
                    width,
                    height,
                    color_type(channels),
                )
            }
            OutputFormat::Png => PngEncoder::new(&mut out).write_image(
                buf.data(),
                width,
                height,
                color_type(buf.channels()),
            ),
            OutputFormat::Bmp => BmpEncoder::new(&mut out).write_image(
                buf.data(),
                width,
                height,
                color_type(buf.channels()),
            ),
        };
        result.map_err(|e| {
            RasterError::encode_failed(format.as_str(), format!("{} encode failed: {e}", format.as_str()))
        })?;
        Ok(out)
    })
}

/// Encode `buf` with the format implied by `path`'s extension and write it.
pub fn encode_path(buf: &PixelBuffer, path: &Path, jpeg_quality: u8) -> EncoderResult<()> {
    let format = OutputFormat::from_path(path, jpeg_quality).map_err(RasterError::unsupported_format)?;
    let bytes = encode_to_vec(buf, format)?;
    std::fs::write(path, &bytes)
        .map_err(|e| RasterError::file_write_failed(path.to_string_lossy().to_string(), e))?;
    tracing::debug!(
        path = %path.display(),
        format = format.as_str(),
        bytes = bytes.len(),
        "image written"
    );
    Ok(())
}
