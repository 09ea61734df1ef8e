// src/engine/threshold.rs
//
// Binarization: fixed global threshold, Otsu, and local-mean adaptive.
// All three read luma (single-channel input is used as-is) and produce a
// single-channel buffer.

use crate::engine::buffer::PixelBuffer;
use crate::engine::common::EngineResult;

/// 256-bin histogram of the buffer's gray values.
pub fn histogram(src: &PixelBuffer) -> [u64; 256] {
    let mut bins = [0u64; 256];
    if src.channels() == 1 {
        for &v in src.data() {
            bins[v as usize] += 1;
        }
    } else {
        for px in src.data().chunks_exact(src.channels()) {
            bins[crate::engine::buffer::luma(px[0], px[1], px[2]) as usize] += 1;
        }
    }
    bins
}

/// `maxval` where `gray > thresh`, else 0. `maxval` is clamped to 0..=255.
pub fn threshold(src: &PixelBuffer, thresh: i32, maxval: i32) -> EngineResult<PixelBuffer> {
    let on = maxval.clamp(0, 255) as u8;
    let mut out = src.to_grayscale()?;
    for v in out.data_mut() {
        *v = if i32::from(*v) > thresh { on } else { 0 };
    }
    Ok(out)
}

/// Otsu's threshold for a histogram.
///
/// Scans candidates in ascending order and keeps the first maximum of the
/// between-class variance `wB * wF * (mB - mF)^2`. Returns 0 when no split
/// has positive variance (e.g. a flat image).
pub fn otsu_level(bins: &[u64; 256]) -> u8 {
    let total: u64 = bins.iter().sum();
    let sum: f64 = bins
        .iter()
        .enumerate()
        .map(|(i, &n)| i as f64 * n as f64)
        .sum();

    let mut sum_b = 0.0f64;
    let mut w_b = 0u64;
    let mut best = 0.0f64;
    let mut level = 0u8;

    for (i, &n) in bins.iter().enumerate() {
        w_b += n;
        if w_b == 0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f == 0 {
            break;
        }
        sum_b += i as f64 * n as f64;
        let m_b = sum_b / w_b as f64;
        let m_f = (sum - sum_b) / w_f as f64;
        let between = w_b as f64 * w_f as f64 * (m_b - m_f) * (m_b - m_f);
        if between > best {
            best = between;
            level = i as u8;
        }
    }
    level
}

/// Binarize at the Otsu level: 255 above it, 0 otherwise.
pub fn otsu(src: &PixelBuffer) -> EngineResult<PixelBuffer> {
    let level = otsu_level(&histogram(src));
    tracing::debug!(level, "otsu threshold");
    threshold(src, i32::from(level), 255)
}

/// Local mean threshold.
///
/// Each pixel is compared against the integer mean of its `block_size`
/// square neighbourhood (clipped at the image edges, so border pixels
/// average fewer samples) minus `c`. Even block sizes are bumped to the next
/// odd size; sizes below 1 act as 1.
pub fn adaptive_threshold(src: &PixelBuffer, block_size: i32, c: i32) -> EngineResult<PixelBuffer> {
    let block = if block_size % 2 == 0 {
        block_size.saturating_add(1)
    } else {
        block_size
    }
    .max(1);
    let half = (block / 2) as usize;

    let gray = src.to_grayscale()?;
    let mut out = gray.blank_like()?;
    let (w, h) = (gray.width() as usize, gray.height() as usize);

    // integral[y][x] = sum of gray over [0, y) x [0, x)
    let iw = w + 1;
    let mut integral = vec![0u64; iw * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += u64::from(gray.data()[y * w + x]);
            integral[(y + 1) * iw + x + 1] = integral[y * iw + x + 1] + row_sum;
        }
    }

    for y in 0..h {
        let y0 = y.saturating_sub(half);
        let y1 = (y + half + 1).min(h);
        for x in 0..w {
            let x0 = x.saturating_sub(half);
            let x1 = (x + half + 1).min(w);
            let sum = integral[y1 * iw + x1] + integral[y0 * iw + x0]
                - integral[y0 * iw + x1]
                - integral[y1 * iw + x0];
            let count = ((y1 - y0) * (x1 - x0)) as u64;
            let local = (sum / count) as i64 - i64::from(c);
            let v = gray.data()[y * w + x];
            out.data_mut()[y * w + x] = if i64::from(v) > local { 255 } else { 0 };
        }
    }
    Ok(out)
}
