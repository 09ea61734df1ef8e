// src/engine/api.rs
//
// ImageEngine: the path-based public surface.
// Every operation decodes its input, works on owned buffers, and encodes the
// result to the output path. Failures come back as RasterError; panics are
// contained by run_with_panic_policy.

use crate::engine::annotate::{self, OverlayMode};
use crate::engine::buffer::PixelBuffer;
use crate::engine::common::{run_with_panic_policy, EngineResult};
use crate::engine::contours;
use crate::engine::decoder::decode_path;
use crate::engine::encoder::encode_path;
use crate::engine::metadata::{self, ImageMetadata};
use crate::engine::pipeline::apply_ops;
use crate::engine::pool::{configured_workers, RowExecutor, DEFAULT_WORKERS};
use crate::engine::threshold;
use crate::ops::{BlurKind, Color, Operation};
use std::path::Path;
use std::time::Instant;

/// Default JPEG quality for `.jpg` / `.jpeg` outputs.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Environment variable that overrides the JPEG quality
pub const JPEG_QUALITY_ENV: &str = "RASTERKIT_JPEG_QUALITY";

/// Engine settings. The worker count is the fixed band count of every
/// row-parallel filter; it does not adapt to image size or hardware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub workers: usize,
    pub jpeg_quality: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `RASTERKIT_WORKERS` / `RASTERKIT_JPEG_QUALITY`.
    /// Unparsable or out-of-range values are ignored.
    pub fn from_env() -> Self {
        let jpeg_quality = std::env::var(JPEG_QUALITY_ENV)
            .ok()
            .and_then(|raw| raw.trim().parse::<u8>().ok())
            .filter(|q| (1..=100).contains(q))
            .unwrap_or(DEFAULT_JPEG_QUALITY);
        Self {
            workers: configured_workers(),
            jpeg_quality,
        }
    }
}

/// Geometry of a decoded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    /// `width * height * channels`
    pub size_bytes: usize,
}

impl From<&PixelBuffer> for ImageInfo {
    fn from(buf: &PixelBuffer) -> Self {
        Self {
            width: buf.width(),
            height: buf.height(),
            channels: buf.channels() as u32,
            size_bytes: buf.size_bytes(),
        }
    }
}

/// The image processing engine.
///
/// Owns the row executor used by the parallel filters; build one and reuse
/// it across calls.
///
/// ```no_run
/// use rasterkit::{ImageEngine, Operation};
///
/// let engine = ImageEngine::new()?;
/// engine.otsu("scan.png", "scan_bw.png")?;
/// engine.process("in.jpg", "out.png", &[Operation::Grayscale, Operation::blur()])?;
/// # Ok::<(), rasterkit::RasterError>(())
/// ```
#[derive(Debug)]
pub struct ImageEngine {
    config: EngineConfig,
    executor: RowExecutor,
}

impl ImageEngine {
    // =========================================================================
    // CONSTRUCTORS
    // =========================================================================

    pub fn new() -> EngineResult<Self> {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> EngineResult<Self> {
        let executor = RowExecutor::new(config.workers)?;
        Ok(Self { config, executor })
    }

    pub fn from_env() -> EngineResult<Self> {
        Self::with_config(EngineConfig::from_env())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn executor(&self) -> &RowExecutor {
        &self.executor
    }

    // =========================================================================
    // PLUMBING
    // =========================================================================

    /// Decode `input`, hand the buffer to `work`, encode what it returns to
    /// `output` (if any) and pass its value back.
    fn run<T, F>(&self, op: &'static str, input: &Path, output: Option<&Path>, work: F) -> EngineResult<T>
    where
        F: FnOnce(PixelBuffer) -> EngineResult<(Option<PixelBuffer>, T)>,
    {
        let result = run_with_panic_policy(op, || {
            let started = Instant::now();
            let buf = decode_path(input)?;
            let decode_ms = started.elapsed().as_secs_f64() * 1000.0;

            let started = Instant::now();
            let (out, value) = work(buf)?;
            let ops_ms = started.elapsed().as_secs_f64() * 1000.0;

            let started = Instant::now();
            if let (Some(out), Some(path)) = (out, output) {
                encode_path(&out, path, self.config.jpeg_quality)?;
            }
            let encode_ms = started.elapsed().as_secs_f64() * 1000.0;

            tracing::debug!(
                op,
                input = %input.display(),
                output = ?output.map(|p| p.display().to_string()),
                decode_ms,
                ops_ms,
                encode_ms,
                "operation complete"
            );
            Ok(value)
        });

        if let Err(err) = &result {
            tracing::warn!(
                op,
                input = %input.display(),
                category = err.category().as_str(),
                error = %err,
                "operation failed"
            );
        }
        result
    }

    fn transform<F>(&self, op: &'static str, input: &Path, output: &Path, f: F) -> EngineResult<()>
    where
        F: FnOnce(PixelBuffer) -> EngineResult<PixelBuffer>,
    {
        self.run(op, input, Some(output), |buf| Ok((Some(f(buf)?), ())))
    }

    fn single(&self, input: &Path, output: &Path, op: Operation) -> EngineResult<()> {
        let name = op.name();
        self.transform(name, input, output, |buf| {
            apply_ops(buf, std::slice::from_ref(&op), &self.executor)
        })
    }

    /// Apply `ops` in order with a single decode and a single encode.
    pub fn process(&self, input: impl AsRef<Path>, output: impl AsRef<Path>, ops: &[Operation]) -> EngineResult<()> {
        self.transform("process", input.as_ref(), output.as_ref(), |buf| {
            apply_ops(buf, ops, &self.executor)
        })
    }

    // =========================================================================
    // TRANSFORMS
    // =========================================================================

    pub fn grayscale(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> EngineResult<()> {
        self.single(input.as_ref(), output.as_ref(), Operation::Grayscale)
    }

    pub fn resize(&self, input: impl AsRef<Path>, output: impl AsRef<Path>, width: i32, height: i32) -> EngineResult<()> {
        self.single(input.as_ref(), output.as_ref(), Operation::Resize { width, height })
    }

    /// Fails with `InvalidCropBounds` (and writes nothing) when the region
    /// leaves the image.
    pub fn crop(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> EngineResult<()> {
        self.single(input.as_ref(), output.as_ref(), Operation::Crop { x, y, width, height })
    }

    pub fn rotate(&self, input: impl AsRef<Path>, output: impl AsRef<Path>, degrees: f32) -> EngineResult<()> {
        self.single(input.as_ref(), output.as_ref(), Operation::Rotate { degrees })
    }

    // =========================================================================
    // FILTERS
    // =========================================================================

    /// `kind` is usually parsed with [`BlurKind::parse`]; defaults are size 5, sigma 1.5.
    pub fn blur(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        kind: BlurKind,
        size: usize,
        sigma: f32,
    ) -> EngineResult<()> {
        self.single(input.as_ref(), output.as_ref(), Operation::Blur { kind, size, sigma })
    }

    pub fn sobel(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> EngineResult<()> {
        self.single(input.as_ref(), output.as_ref(), Operation::Sobel)
    }

    pub fn canny(&self, input: impl AsRef<Path>, output: impl AsRef<Path>, low: f32, high: f32) -> EngineResult<()> {
        self.single(input.as_ref(), output.as_ref(), Operation::Canny { low, high })
    }

    pub fn threshold(&self, input: impl AsRef<Path>, output: impl AsRef<Path>, thresh: i32, maxval: i32) -> EngineResult<()> {
        self.single(input.as_ref(), output.as_ref(), Operation::Threshold { thresh, maxval })
    }

    pub fn otsu(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> EngineResult<()> {
        self.single(input.as_ref(), output.as_ref(), Operation::Otsu)
    }

    pub fn adaptive_threshold(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        block_size: i32,
        c: i32,
    ) -> EngineResult<()> {
        self.single(input.as_ref(), output.as_ref(), Operation::AdaptiveThreshold { block_size, c })
    }

    pub fn erode(&self, input: impl AsRef<Path>, output: impl AsRef<Path>, size: usize) -> EngineResult<()> {
        self.single(input.as_ref(), output.as_ref(), Operation::Erode { size })
    }

    pub fn dilate(&self, input: impl AsRef<Path>, output: impl AsRef<Path>, size: usize) -> EngineResult<()> {
        self.single(input.as_ref(), output.as_ref(), Operation::Dilate { size })
    }

    pub fn open(&self, input: impl AsRef<Path>, output: impl AsRef<Path>, size: usize) -> EngineResult<()> {
        self.single(input.as_ref(), output.as_ref(), Operation::Open { size })
    }

    pub fn close(&self, input: impl AsRef<Path>, output: impl AsRef<Path>, size: usize) -> EngineResult<()> {
        self.single(input.as_ref(), output.as_ref(), Operation::Close { size })
    }

    // =========================================================================
    // DRAWING
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub fn draw_line(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: Color,
        thickness: i32,
    ) -> EngineResult<()> {
        let op = Operation::DrawLine { x1, y1, x2, y2, color, thickness };
        self.single(input.as_ref(), output.as_ref(), op)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Color,
        thickness: i32,
    ) -> EngineResult<()> {
        let op = Operation::DrawRect { x, y, width, height, color, thickness };
        self.single(input.as_ref(), output.as_ref(), op)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fill_rect(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Color,
    ) -> EngineResult<()> {
        let op = Operation::FillRect { x, y, width, height, color };
        self.single(input.as_ref(), output.as_ref(), op)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_circle(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        cx: i32,
        cy: i32,
        radius: i32,
        color: Color,
        thickness: i32,
    ) -> EngineResult<()> {
        let op = Operation::DrawCircle { cx, cy, radius, color, thickness };
        self.single(input.as_ref(), output.as_ref(), op)
    }

    /// Only the digits 0-9 have glyphs; other characters advance the cursor.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        x: i32,
        y: i32,
        text: &str,
        color: Color,
        scale: i32,
    ) -> EngineResult<()> {
        let op = Operation::DrawText {
            x,
            y,
            text: text.to_string(),
            color,
            scale,
        };
        self.single(input.as_ref(), output.as_ref(), op)
    }

    // =========================================================================
    // ANALYSIS
    // =========================================================================

    /// Outline connected edge components on a copy of the input. Returns the
    /// number of boxes drawn (at most `MAX_CONTOURS`).
    pub fn detect_contours(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        color: Color,
        thickness: i32,
    ) -> EngineResult<usize> {
        self.run("detect_contours", input.as_ref(), Some(output.as_ref()), |buf| {
            let (out, count) = contours::detect_contours(&buf, color, thickness)?;
            Ok((Some(out), count))
        })
    }

    pub fn info(&self, input: impl AsRef<Path>) -> EngineResult<ImageInfo> {
        self.run("info", input.as_ref(), None, |buf| Ok((None, ImageInfo::from(&buf))))
    }

    /// 256-bin luma histogram of the input.
    pub fn histogram(&self, input: impl AsRef<Path>) -> EngineResult<[u64; 256]> {
        self.run("histogram", input.as_ref(), None, |buf| {
            Ok((None, threshold::histogram(&buf)))
        })
    }

    /// EXIF camera, exposure and GPS fields. No pixels are decoded.
    pub fn metadata(&self, input: impl AsRef<Path>) -> EngineResult<ImageMetadata> {
        let input = input.as_ref();
        let result = run_with_panic_policy("metadata", || metadata::read_metadata(input));
        if let Err(err) = &result {
            tracing::warn!(
                op = "metadata",
                input = %input.display(),
                category = err.category().as_str(),
                error = %err,
                "operation failed"
            );
        }
        result
    }

    // =========================================================================
    // FIXED-GEOMETRY STUBS
    // =========================================================================

    pub fn detect_faces(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> EngineResult<usize> {
        self.run("detect_faces", input.as_ref(), Some(output.as_ref()), |buf| {
            let (out, count) = annotate::detect_faces(&buf);
            Ok((Some(out), count))
        })
    }

    pub fn detect_plate(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> EngineResult<usize> {
        self.run("detect_plate", input.as_ref(), Some(output.as_ref()), |buf| {
            let (out, count) = annotate::detect_plate(&buf);
            Ok((Some(out), count))
        })
    }

    pub fn detect_plate_outline(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        color_choice: i32,
    ) -> EngineResult<usize> {
        self.run("detect_plate_outline", input.as_ref(), Some(output.as_ref()), |buf| {
            let (out, count) = annotate::detect_plate_outline(&buf, color_choice);
            Ok((Some(out), count))
        })
    }

    pub fn hough_lines(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> EngineResult<usize> {
        self.run("hough_lines", input.as_ref(), Some(output.as_ref()), |buf| {
            let (out, count) = annotate::hough_lines(&buf);
            Ok((Some(out), count))
        })
    }

    /// The template is not read; the reported match is always (100, 100).
    pub fn template_match(
        &self,
        input: impl AsRef<Path>,
        template: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> EngineResult<(i32, i32)> {
        tracing::debug!(template = %template.as_ref().display(), "template_match ignores the template");
        self.run("template_match", input.as_ref(), Some(output.as_ref()), |buf| {
            let (out, at) = annotate::template_match(&buf);
            Ok((Some(out), at))
        })
    }

    /// Writes an unmodified copy. `max_iters` defaults to
    /// `DEFAULT_KMEANS_ITERS`.
    pub fn kmeans(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        k: i32,
        max_iters: Option<i32>,
    ) -> EngineResult<()> {
        let max_iters = max_iters.unwrap_or(annotate::DEFAULT_KMEANS_ITERS);
        self.transform("kmeans", input.as_ref(), output.as_ref(), |buf| {
            Ok(annotate::kmeans(&buf, k, max_iters))
        })
    }

    /// Writes an unmodified copy.
    pub fn equalize_hist(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> EngineResult<()> {
        self.transform("equalize_hist", input.as_ref(), output.as_ref(), |buf| {
            Ok(annotate::equalize_hist(&buf))
        })
    }

    /// Mode 1 paints edges green, 2 outlines contours in red, 3 draws the
    /// plate box; any other mode writes an unmodified copy.
    pub fn overlay(&self, input: impl AsRef<Path>, output: impl AsRef<Path>, mode: i32) -> EngineResult<()> {
        self.transform("overlay", input.as_ref(), output.as_ref(), |buf| {
            annotate::overlay(&buf, OverlayMode::from_code(mode))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.jpeg_quality, 95);
        let engine = ImageEngine::with_config(config).unwrap();
        assert_eq!(engine.executor().workers(), 4);
    }

    #[test]
    fn info_reports_geometry() {
        let buf = PixelBuffer::new(7, 3, 4).unwrap();
        let info = ImageInfo::from(&buf);
        assert_eq!(
            info,
            ImageInfo {
                width: 7,
                height: 3,
                channels: 4,
                size_bytes: 84
            }
        );
    }

    #[test]
    fn missing_input_is_an_io_error() {
        let engine = ImageEngine::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = engine
            .grayscale(dir.path().join("absent.png"), dir.path().join("out.png"))
            .unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::IoError);
        assert!(!dir.path().join("out.png").exists());
    }
}
