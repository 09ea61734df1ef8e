// src/engine.rs
//
// The core of rasterkit. Every public operation:
// 1. Decodes the source into a PixelBuffer
// 2. Runs filters / rasterization / transforms on owned buffers
// 3. Encodes the result to the destination path
//
// This file is a facade that delegates to the decomposed modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Larger buffers are rejected before allocation to prevent decompression bombs.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod annotate;
mod api;
mod buffer;
mod common;
mod contours;
mod decoder;
mod edges;
mod encoder;
mod filters;
mod metadata;
mod morphology;
mod pipeline;
mod pool;
mod raster;
mod threshold;
mod transform;

// =============================================================================
// PUBLIC EXPORTS
// =============================================================================

pub use annotate::{
    detect_faces, detect_plate, detect_plate_outline, equalize_hist, hough_lines, kmeans, overlay,
    template_match, OverlayMode, DEFAULT_KMEANS_ITERS,
};
pub use api::{EngineConfig, ImageEngine, ImageInfo};
pub use buffer::{luma, PixelBuffer};
pub use common::{run_with_panic_policy, EngineResult};
pub use contours::{
    detect_contours, find_contours, find_contours_with, Labeling, Rect, MAX_CONTOURS,
    MIN_CONTOUR_EXTENT,
};
pub use decoder::{check_dimensions, decode_bytes, decode_path};
pub use edges::{canny, sobel};
pub use encoder::{encode_path, encode_to_vec};
pub use filters::{blur, median_filter, Kernel, BLUR_WINDOW};
pub use metadata::{
    format_dms, format_exposure, read_metadata, read_metadata_bytes, GpsPosition, ImageMetadata,
};
pub use morphology::{close, dilate, erode, open, DEFAULT_ELEMENT_SIZE};
pub use pipeline::{apply_op, apply_ops};
pub use pool::{configured_workers, RowExecutor, DEFAULT_WORKERS};
pub use raster::{
    draw_char, draw_circle, draw_line, draw_rect, draw_text, fill_rect, set_pixel, GLYPH_COLS,
    GLYPH_ROWS,
};
pub use threshold::{adaptive_threshold, histogram, otsu, otsu_level, threshold};
pub use transform::{crop, fast_resize, resize, rotate, rotated_frame, RotatedFrame};
