// src/engine/buffer.rs
//
// PixelBuffer: owned, row-major, channel-interleaved 8-bit pixels.

use crate::engine::decoder::check_dimensions;
use crate::error::RasterError;

type BufferResult<T> = std::result::Result<T, RasterError>;

/// Luma of an RGB triple (`0.299R + 0.587G + 0.114B`), truncated.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) as u8
}

/// An owned pixel grid.
///
/// Invariant: `data.len() == width * height * channels` and
/// `channels` is 1, 3 or 4. Ownership is always single; stages hand
/// buffers to each other by value.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("len", &self.data.len())
            .finish()
    }
}

fn validate_channels(channels: u32) -> BufferResult<u8> {
    match channels {
        1 | 3 | 4 => Ok(channels as u8),
        other => Err(RasterError::invalid_channel_count(other)),
    }
}

fn byte_len(width: u32, height: u32, channels: u8) -> BufferResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(channels as usize))
        .ok_or_else(|| {
            RasterError::pixel_count_exceeds_limit(
                u64::from(width) * u64::from(height),
                crate::engine::MAX_PIXELS,
            )
        })
}

impl PixelBuffer {
    /// Allocate a zero-initialized buffer.
    ///
    /// Fails with `InvalidDimensions` for a zero side, `InvalidChannelCount`
    /// outside {1,3,4}, a limit error past `MAX_DIMENSION`/`MAX_PIXELS`, and
    /// `AllocationFailed` if the allocator refuses.
    pub fn new(width: u32, height: u32, channels: u32) -> BufferResult<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::invalid_dimensions(
                i64::from(width),
                i64::from(height),
            ));
        }
        let channels = validate_channels(channels)?;
        check_dimensions(width, height)?;
        let len = byte_len(width, height, channels)?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| RasterError::allocation_failed(len))?;
        data.resize(len, 0);

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Wrap existing pixel bytes. The length must match the geometry exactly.
    pub fn from_raw(width: u32, height: u32, channels: u32, data: Vec<u8>) -> BufferResult<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::invalid_dimensions(
                i64::from(width),
                i64::from(height),
            ));
        }
        let channels = validate_channels(channels)?;
        check_dimensions(width, height)?;
        let expected = byte_len(width, height, channels)?;
        if data.len() != expected {
            return Err(RasterError::invalid_argument(
                "data",
                format!("{} bytes", data.len()),
                format!("expected {expected} bytes for {width}x{height}x{channels}"),
            ));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Zeroed buffer with the same geometry as `self`.
    pub fn blank_like(&self) -> BufferResult<Self> {
        Self::new(self.width, self.height, u32::from(self.channels))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels as usize
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// Total byte size (`width * height * channels`).
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// Byte offset of pixel (x, y). Caller guarantees bounds.
    #[inline]
    pub fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width as usize + x) * self.channels as usize
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.stride();
        &self.data[y * stride..(y + 1) * stride]
    }

    /// Channel values of pixel (x, y).
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let at = self.offset(x, y);
        &self.data[at..at + self.channels as usize]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [u8] {
        let at = self.offset(x, y);
        let channels = self.channels as usize;
        &mut self.data[at..at + channels]
    }

    /// Bounds-checked channel read.
    pub fn get(&self, x: u32, y: u32, c: usize) -> Option<u8> {
        if x >= self.width || y >= self.height || c >= self.channels as usize {
            return None;
        }
        Some(self.data[self.offset(x as usize, y as usize) + c])
    }

    /// Gray value of a pixel: the stored value for single-channel buffers,
    /// the luma of the first three channels otherwise.
    #[inline]
    pub fn gray_at(&self, x: usize, y: usize) -> u8 {
        let px = self.pixel(x, y);
        if self.channels == 1 {
            px[0]
        } else {
            luma(px[0], px[1], px[2])
        }
    }

    /// Single-channel luma copy. Single-channel buffers are copied verbatim.
    pub fn to_grayscale(&self) -> BufferResult<Self> {
        if self.channels == 1 {
            return Ok(self.clone());
        }
        let mut gray = Self::new(self.width, self.height, 1)?;
        let channels = self.channels as usize;
        for (dst, px) in gray.data.iter_mut().zip(self.data.chunks_exact(channels)) {
            *dst = luma(px[0], px[1], px[2]);
        }
        Ok(gray)
    }

    /// Overwrite every pixel within `margin` of an edge with the
    /// corresponding pixel of `src` (same geometry required).
    pub fn copy_border_from(&mut self, src: &PixelBuffer, margin: usize) {
        debug_assert_eq!(
            (self.width, self.height, self.channels),
            (src.width, src.height, src.channels)
        );
        let (w, h) = (self.width as usize, self.height as usize);
        let stride = self.stride();
        let channels = self.channels as usize;
        for y in 0..h {
            let row = y * stride..(y + 1) * stride;
            if y < margin || y + margin >= h {
                self.data[row.clone()].copy_from_slice(&src.data[row]);
                continue;
            }
            let left = margin.min(w);
            self.data[row.start..row.start + left * channels]
                .copy_from_slice(&src.data[row.start..row.start + left * channels]);
            let right_start = w.saturating_sub(margin).max(left);
            self.data[row.start + right_start * channels..row.end]
                .copy_from_slice(&src.data[row.start + right_start * channels..row.end]);
        }
    }
}
