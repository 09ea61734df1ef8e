// lib.rs
//
// rasterkit: a raster image-processing engine.
//
// Design goals:
// - Owned pixel buffers handed stage to stage, never shared
// - Row-parallel filters on an explicit, caller-owned executor
// - Every public operation returns a Result; no panic crosses the API
// - Bit-exact integer behaviour for thresholds, morphology and transforms

pub mod engine;
pub mod error;
pub mod ops;

pub use engine::{EngineConfig, ImageEngine, ImageInfo, ImageMetadata, PixelBuffer, RowExecutor};
pub use error::{ErrorCategory, Outcome, RasterError};
pub use ops::{BlurKind, Color, Operation, OutputFormat};

/// Library identity, as reported by [`version`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: &'static str,
    pub name: &'static str,
    /// Default band count of the row-parallel executor
    pub max_threads: usize,
}

/// Get library version
pub fn version() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
        name: env!("CARGO_PKG_NAME"),
        max_threads: engine::DEFAULT_WORKERS,
    }
}

/// Get supported input formats
pub fn supported_input_formats() -> &'static [&'static str] {
    &["jpeg", "jpg", "png", "webp", "bmp"]
}

/// Get supported output formats
pub fn supported_output_formats() -> &'static [&'static str] {
    &["jpeg", "jpg", "png", "bmp"]
}
