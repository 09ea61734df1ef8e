// src/engine/transform.rs
//
// Geometric transforms: crop, arbitrary-angle rotate, and resampling resize.
//
// Rotate uses truncating f32 trigonometry for both the output frame and the
// inverse sampling map; the exact integer results matter because callers
// compare rotated output byte-for-byte.

use crate::engine::buffer::PixelBuffer;
use crate::engine::common::EngineResult;
use crate::engine::decoder::check_dimensions;
use crate::error::RasterError;
use fast_image_resize::{self as fir, ImageBufferError, MulDiv, PixelType, ResizeOptions};
use image::{GrayImage, RgbImage, RgbaImage};

/// Copy the `width` x `height` region at (x, y) into a new buffer.
///
/// The region must lie entirely inside `src` and have positive extent.
pub fn crop(src: &PixelBuffer, x: i32, y: i32, width: i32, height: i32) -> EngineResult<PixelBuffer> {
    let (img_w, img_h) = (src.width(), src.height());
    let fits = x >= 0
        && y >= 0
        && width > 0
        && height > 0
        && i64::from(x) + i64::from(width) <= i64::from(img_w)
        && i64::from(y) + i64::from(height) <= i64::from(img_h);
    if !fits {
        return Err(RasterError::invalid_crop_bounds(x, y, width, height, img_w, img_h));
    }

    let (x, y, w, h) = (x as usize, y as usize, width as usize, height as usize);
    let mut out = PixelBuffer::new(w as u32, h as u32, src.channels() as u32)?;
    let channels = src.channels();
    let row_bytes = w * channels;
    for row in 0..h {
        let from = src.offset(x, y + row);
        out.data_mut()[row * row_bytes..(row + 1) * row_bytes]
            .copy_from_slice(&src.data()[from..from + row_bytes]);
    }
    Ok(out)
}

/// Output frame of a rotation: canvas size, the offset that brings every
/// rotated corner into view, and the truncated trig factors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotatedFrame {
    pub width: i64,
    pub height: i64,
    pub offset_x: i64,
    pub offset_y: i64,
    pub cos: f32,
    pub sin: f32,
}

/// Bounding frame of a `width` x `height` image rotated by `degrees`.
///
/// Each corner is rotated about the origin and truncated to an integer; the
/// frame spans the extremes inclusively, so it is one pixel larger than the
/// corner spread in each axis.
pub fn rotated_frame(width: u32, height: u32, degrees: f32) -> RotatedFrame {
    // Radians are rounded to f32 before the trig call; near right angles the
    // sign of the residual term decides which way every sample truncates.
    let rad = (f64::from(degrees) * std::f64::consts::PI / 180.0) as f32;
    let (cos, sin) = (f64::from(rad).cos() as f32, f64::from(rad).sin() as f32);
    let (w, h) = (width as f32, height as f32);

    let corners = [(0.0f32, 0.0f32), (w, 0.0), (0.0, h), (w, h)];
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (0i64, 0i64, 0i64, 0i64);
    for (i, &(cx, cy)) in corners.iter().enumerate() {
        let nx = (cx * cos - cy * sin) as i64;
        let ny = (cx * sin + cy * cos) as i64;
        if i == 0 {
            (min_x, max_x, min_y, max_y) = (nx, nx, ny, ny);
        } else {
            min_x = min_x.min(nx);
            max_x = max_x.max(nx);
            min_y = min_y.min(ny);
            max_y = max_y.max(ny);
        }
    }

    RotatedFrame {
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
        offset_x: -min_x,
        offset_y: -min_y,
        cos,
        sin,
    }
}

/// Rotate by `degrees` about the origin, growing the canvas to the rotated
/// bounding box. Destination pixels whose inverse map falls outside `src`
/// stay 0; sampling truncates rather than interpolating.
pub fn rotate(src: &PixelBuffer, degrees: f32) -> EngineResult<PixelBuffer> {
    if !degrees.is_finite() {
        return Err(RasterError::invalid_argument(
            "degrees",
            degrees.to_string(),
            "rotation angle must be finite",
        ));
    }
    let frame = rotated_frame(src.width(), src.height(), degrees);
    if frame.width > i64::from(u32::MAX) || frame.height > i64::from(u32::MAX) {
        return Err(RasterError::dimension_exceeds_limit(
            frame.width.max(frame.height) as u64,
            crate::engine::MAX_DIMENSION,
        ));
    }
    let mut out = PixelBuffer::new(frame.width as u32, frame.height as u32, src.channels() as u32)?;

    let (src_w, src_h) = (i64::from(src.width()), i64::from(src.height()));
    let channels = src.channels();
    let (out_w, out_h) = (frame.width as usize, frame.height as usize);
    for y in 0..out_h {
        let fy = (y as i64 - frame.offset_y) as f32;
        for x in 0..out_w {
            let fx = (x as i64 - frame.offset_x) as f32;
            let sx = (fx * frame.cos + fy * frame.sin) as i64;
            let sy = (-fx * frame.sin + fy * frame.cos) as i64;
            if sx < 0 || sy < 0 || sx >= src_w || sy >= src_h {
                continue;
            }
            let from = src.offset(sx as usize, sy as usize);
            let to = out.offset(x, y);
            out.data_mut()[to..to + channels].copy_from_slice(&src.data()[from..from + channels]);
        }
    }
    Ok(out)
}

/// Resample to exactly `width` x `height`, keeping the channel count.
pub fn resize(src: &PixelBuffer, width: i32, height: i32) -> EngineResult<PixelBuffer> {
    if width <= 0 || height <= 0 {
        return Err(RasterError::invalid_dimensions(
            i64::from(width),
            i64::from(height),
        ));
    }
    let (width, height) = (width as u32, height as u32);
    check_dimensions(width, height)?;
    fast_resize(src, width, height)
}

fn pixel_type(channels: usize) -> PixelType {
    match channels {
        1 => PixelType::U8,
        4 => PixelType::U8x4,
        _ => PixelType::U8x3,
    }
}

/// Lanczos3 resample through fast_image_resize, falling back to the image
/// crate's resampler if the fast path refuses the buffer.
pub fn fast_resize(src: &PixelBuffer, dst_width: u32, dst_height: u32) -> EngineResult<PixelBuffer> {
    let source_dims = (src.width(), src.height());
    let target_dims = (dst_width, dst_height);
    let channels = src.channels();
    let pixel_type = pixel_type(channels);
    let options =
        ResizeOptions::new().resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3));

    let mut src_pixels = src.data().to_vec();
    let primary = match fir::images::Image::from_slice_u8(
        src.width(),
        src.height(),
        src_pixels.as_mut_slice(),
        pixel_type,
    ) {
        Ok(image) => resize_with_source_image(image, pixel_type, dst_width, dst_height, &options),
        Err(ImageBufferError::InvalidBufferAlignment) => {
            let mut aligned = fir::images::Image::new(src.width(), src.height(), pixel_type);
            aligned.buffer_mut().copy_from_slice(src.data());
            resize_with_source_image(aligned, pixel_type, dst_width, dst_height, &options)
        }
        Err(other) => Err(format!("fir source image error: {other:?}")),
    };

    let pixels = match primary {
        Ok(pixels) => pixels,
        Err(err) => {
            tracing::warn!(%err, "fast resize failed, using image crate fallback");
            resize_with_image_crate_fallback(src, dst_width, dst_height).map_err(|fallback| {
                RasterError::resize_failed(
                    source_dims,
                    target_dims,
                    format!("{err}; image crate fallback failed: {fallback}"),
                )
            })?
        }
    };
    PixelBuffer::from_raw(dst_width, dst_height, channels as u32, pixels)
}

fn resize_with_source_image(
    mut src_image: fir::images::Image<'_>,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
    options: &ResizeOptions,
) -> std::result::Result<Vec<u8>, String> {
    let mut dst_image = fir::images::Image::new(dst_width, dst_height, pixel_type);

    // alpha is premultiplied so transparent pixels do not bleed colour
    let premultiply = pixel_type == PixelType::U8x4;
    let mul_div = MulDiv::default();
    if premultiply {
        mul_div
            .multiply_alpha_inplace(&mut src_image)
            .map_err(|e| format!("failed to premultiply alpha: {e}"))?;
    }

    fir::Resizer::new()
        .resize(&src_image, &mut dst_image, options)
        .map_err(|e| format!("fir resize error: {e:?}"))?;

    if premultiply {
        mul_div
            .divide_alpha_inplace(&mut dst_image)
            .map_err(|e| format!("failed to unpremultiply alpha: {e}"))?;
    }
    Ok(dst_image.into_vec())
}

fn resize_with_image_crate_fallback(
    src: &PixelBuffer,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<Vec<u8>, String> {
    let filter = image::imageops::FilterType::Lanczos3;
    let (w, h, raw) = (src.width(), src.height(), src.data().to_vec());
    match src.channels() {
        1 => {
            let gray = GrayImage::from_raw(w, h, raw)
                .ok_or_else(|| "failed to build gray image for fallback resize".to_string())?;
            Ok(image::imageops::resize(&gray, dst_width, dst_height, filter).into_raw())
        }
        3 => {
            let rgb = RgbImage::from_raw(w, h, raw)
                .ok_or_else(|| "failed to build rgb image for fallback resize".to_string())?;
            Ok(image::imageops::resize(&rgb, dst_width, dst_height, filter).into_raw())
        }
        4 => {
            let rgba = RgbaImage::from_raw(w, h, raw)
                .ok_or_else(|| "failed to build rgba image for fallback resize".to_string())?;
            Ok(image::imageops::resize(&rgba, dst_width, dst_height, filter).into_raw())
        }
        other => Err(format!("fallback resize does not support {other} channels")),
    }
}
