// src/engine/filters.rs
//
// Convolution and rank filters driven by the RowExecutor.
//
// Every convolution runs through one fixed 5x5 window. Kernels of any other
// footprint are embedded center-aligned into that window, so the interior /
// border boundary never moves with the kernel size:
// - pixels whose 5x5 window fits inside the image are convolved
// - the remaining 2px band is copied from the source verbatim
//
// The median filter uses a 3x3 window and copies its 1px ring the same way.

use crate::engine::buffer::PixelBuffer;
use crate::engine::common::EngineResult;
use crate::engine::pool::RowExecutor;
use crate::engine::MAX_DIMENSION;
use crate::error::RasterError;
use crate::ops::BlurKind;
use std::ops::Range;

/// Side of the convolution window every blur runs through.
pub const BLUR_WINDOW: usize = 5;

const HALF: usize = BLUR_WINDOW / 2;

/// A square weight matrix, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f32>,
}

impl Kernel {
    /// Normalized 2-D gaussian of side `size` centered on `size / 2`.
    ///
    /// A non-positive (or non-finite) sigma degenerates to the identity kernel.
    /// Sides past `MAX_DIMENSION` are rejected, and a weight matrix the
    /// allocator refuses surfaces as `AllocationFailed`.
    pub fn gaussian(size: usize, sigma: f32) -> EngineResult<Self> {
        if size > MAX_DIMENSION as usize {
            return Err(RasterError::invalid_argument(
                "size",
                size.to_string(),
                format!("kernel side must not exceed {MAX_DIMENSION}"),
            ));
        }
        let size = size.max(1);
        let center = (size / 2) as f32;
        let len = size * size;
        let mut weights = Vec::new();
        weights
            .try_reserve_exact(len)
            .map_err(|_| RasterError::allocation_failed(len * std::mem::size_of::<f32>()))?;
        weights.resize(len, 0.0f32);

        if !(sigma > 0.0 && sigma.is_finite()) {
            weights[(size / 2) * size + size / 2] = 1.0;
            return Ok(Self { size, weights });
        }

        let denom = 2.0 * sigma * sigma;
        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 - center;
                let dy = y as f32 - center;
                weights[y * size + x] = (-(dx * dx + dy * dy) / denom).exp();
            }
        }
        let sum: f32 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }
        Ok(Self { size, weights })
    }

    /// Uniform 3x3 box, each cell 1/9.
    pub fn average() -> Self {
        Self {
            size: 3,
            weights: vec![1.0 / 9.0; 9],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// The kernel laid into the fixed 5x5 window.
    ///
    /// Cells that fall outside the window are dropped; if that happens the
    /// surviving weights are rescaled so the window keeps the kernel's sum.
    fn window(&self) -> [[f32; BLUR_WINDOW]; BLUR_WINDOW] {
        let mut window = [[0.0f32; BLUR_WINDOW]; BLUR_WINDOW];
        let center = (self.size / 2) as isize;
        let mut kept = 0.0f32;
        for ky in 0..self.size {
            for kx in 0..self.size {
                let wy = ky as isize - center + HALF as isize;
                let wx = kx as isize - center + HALF as isize;
                if (0..BLUR_WINDOW as isize).contains(&wy) && (0..BLUR_WINDOW as isize).contains(&wx) {
                    let w = self.weights[ky * self.size + kx];
                    window[wy as usize][wx as usize] = w;
                    kept += w;
                }
            }
        }

        let total = self.sum();
        if kept > 0.0 && (kept - total).abs() > f32::EPSILON {
            let scale = total / kept;
            for row in &mut window {
                for w in row.iter_mut() {
                    *w *= scale;
                }
            }
        }
        window
    }
}

/// Smooth `src` with the given kernel family.
///
/// `size` and `sigma` only shape the gaussian kernel; the average kernel is
/// always a 3x3 box and the median always a 3x3 rank filter.
pub fn blur(
    src: &PixelBuffer,
    kind: BlurKind,
    size: usize,
    sigma: f32,
    executor: &RowExecutor,
) -> EngineResult<PixelBuffer> {
    let kernel = match kind {
        BlurKind::Median => return median_filter(src, executor),
        BlurKind::Gaussian => Kernel::gaussian(size, sigma)?,
        BlurKind::Average => Kernel::average(),
    };
    convolve(src, &kernel, executor)
}

fn convolve(src: &PixelBuffer, kernel: &Kernel, executor: &RowExecutor) -> EngineResult<PixelBuffer> {
    let window = kernel.window();
    let mut dst = src.blank_like()?;
    let (w, h) = (src.width() as usize, src.height() as usize);

    if w > 2 * HALF && h > 2 * HALF {
        executor.run(src, &mut dst, |src, band, rows| {
            convolve_band(src, band, rows, &window)
        })?;
    }
    dst.copy_border_from(src, HALF);
    Ok(dst)
}

fn convolve_band(
    src: &PixelBuffer,
    band: &mut [u8],
    rows: Range<usize>,
    window: &[[f32; BLUR_WINDOW]; BLUR_WINDOW],
) {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let channels = src.channels();
    let stride = src.stride();
    let data = src.data();

    for y in rows.clone() {
        if y < HALF || y + HALF >= h {
            continue;
        }
        let out_row = (y - rows.start) * stride;
        for x in HALF..w - HALF {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for (ky, weights) in window.iter().enumerate() {
                    let base = (y + ky - HALF) * stride + (x - HALF) * channels + c;
                    for (kx, &k) in weights.iter().enumerate() {
                        sum += f32::from(data[base + kx * channels]) * k;
                    }
                }
                band[out_row + x * channels + c] = sum as u8;
            }
        }
    }
}

/// 3x3 per-channel median. The outermost pixel ring is copied from `src`.
pub fn median_filter(src: &PixelBuffer, executor: &RowExecutor) -> EngineResult<PixelBuffer> {
    let mut dst = src.blank_like()?;
    let (w, h) = (src.width() as usize, src.height() as usize);

    if w > 2 && h > 2 {
        executor.run(src, &mut dst, |src, band, rows| {
            let channels = src.channels();
            let stride = src.stride();
            let data = src.data();
            let mut window = [0u8; 9];
            for y in rows.clone() {
                if y == 0 || y + 1 >= h {
                    continue;
                }
                let out_row = (y - rows.start) * stride;
                for x in 1..w - 1 {
                    for c in 0..channels {
                        let mut i = 0;
                        for yy in y - 1..=y + 1 {
                            for xx in x - 1..=x + 1 {
                                window[i] = data[yy * stride + xx * channels + c];
                                i += 1;
                            }
                        }
                        window.sort_unstable();
                        band[out_row + x * channels + c] = window[4];
                    }
                }
            }
        })?;
    }
    dst.copy_border_from(src, 1);
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec() -> RowExecutor {
        RowExecutor::new(4).unwrap()
    }

    fn noisy(w: u32, h: u32, channels: u32) -> PixelBuffer {
        let data = (0..w * h * channels)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8)
            .collect();
        PixelBuffer::from_raw(w, h, channels, data).unwrap()
    }

    #[test]
    fn gaussian_weights_are_normalized_and_peak_at_center() {
        for &(size, sigma) in &[(3, 0.8), (5, 1.5), (7, 2.0)] {
            let k = Kernel::gaussian(size, sigma).unwrap();
            assert!((k.sum() - 1.0).abs() < 1e-4);
            let center = k.weights()[(size / 2) * size + size / 2];
            assert!(k.weights().iter().all(|&w| w <= center));
        }
    }

    #[test]
    fn zero_sigma_is_identity() {
        let src = noisy(12, 10, 3);
        let out = blur(&src, BlurKind::Gaussian, 5, 0.0, &exec()).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn kernel_side_past_limit_is_rejected() {
        let err = blur(&noisy(16, 16, 3), BlurKind::Gaussian, 60_001, 1.5, &exec()).unwrap_err();
        assert!(matches!(err, RasterError::InvalidArgument { .. }));
        assert_eq!(err.category(), crate::error::ErrorCategory::UserError);
        assert!(Kernel::gaussian(MAX_DIMENSION as usize + 1, 0.0).is_err());
    }

    #[test]
    fn oversized_kernel_is_cropped_to_window() {
        let window = Kernel::gaussian(9, 3.0).unwrap().window();
        let sum: f32 = window.iter().flatten().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn average_kernel_sits_in_window_center() {
        let window = Kernel::average().window();
        for (y, row) in window.iter().enumerate() {
            for (x, &w) in row.iter().enumerate() {
                let inner = (1..=3).contains(&x) && (1..=3).contains(&y);
                assert_eq!(w > 0.0, inner);
            }
        }
    }

    #[test]
    fn border_band_is_copied_from_source() {
        let src = noisy(9, 8, 3);
        let out = blur(&src, BlurKind::Gaussian, 5, 1.5, &exec()).unwrap();
        for y in 0..8 {
            for x in 0..9 {
                if x < 2 || y < 2 || x >= 7 || y >= 6 {
                    assert_eq!(out.pixel(x, y), src.pixel(x, y), "({x},{y})");
                }
            }
        }
    }

    #[test]
    fn flat_image_stays_flat() {
        let src = PixelBuffer::from_raw(10, 10, 1, vec![100; 100]).unwrap();
        for kind in [BlurKind::Gaussian, BlurKind::Average, BlurKind::Median] {
            let out = blur(&src, kind, 5, 1.5, &exec()).unwrap();
            assert!(out.data().iter().all(|&v| (99..=100).contains(&v)), "{kind:?}");
        }
    }

    #[test]
    fn tiny_images_pass_through() {
        let src = noisy(3, 3, 1);
        assert_eq!(blur(&src, BlurKind::Gaussian, 5, 1.5, &exec()).unwrap(), src);
        let src = noisy(2, 7, 3);
        assert_eq!(median_filter(&src, &exec()).unwrap(), src);
    }

    #[test]
    fn median_removes_salt_noise() {
        let mut src = PixelBuffer::from_raw(5, 5, 1, vec![10; 25]).unwrap();
        src.pixel_mut(2, 2)[0] = 255;
        let out = median_filter(&src, &exec()).unwrap();
        assert_eq!(out.pixel(2, 2)[0], 10);
    }

    #[test]
    fn result_does_not_depend_on_worker_count() {
        let src = noisy(31, 23, 4);
        for kind in [BlurKind::Gaussian, BlurKind::Average, BlurKind::Median] {
            let one = blur(&src, kind, 5, 1.5, &RowExecutor::new(1).unwrap()).unwrap();
            let four = blur(&src, kind, 5, 1.5, &exec()).unwrap();
            assert_eq!(one, four);
        }
    }
}
