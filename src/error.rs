// src/error.rs
//
// Unified error handling for rasterkit
// Uses thiserror for simple, type-safe error handling
//
// Error Taxonomy:
// - UserError: Invalid arguments, recoverable
// - InvalidGeometry: Rectangles/dimensions outside the buffer
// - IoError: Source unreadable, destination unwritable
// - CodecError: Format/encoding issues
// - ResourceLimit: Memory/dimension limits
// - InternalBug: Library bugs (should not happen)

use std::borrow::Cow;
use thiserror::Error;

/// Error taxonomy used to classify every [`RasterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid argument, recoverable by the caller
    UserError,
    /// Geometry outside the buffer, reported before any mutation
    InvalidGeometry,
    /// File system failures
    IoError,
    /// Format/encoding issues
    CodecError,
    /// Memory/dimension limits
    ResourceLimit,
    /// Library bugs (should not happen)
    InternalBug,
}

impl ErrorCategory {
    /// Get string representation of error category
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "UserError",
            ErrorCategory::InvalidGeometry => "InvalidGeometry",
            ErrorCategory::IoError => "IoError",
            ErrorCategory::CodecError => "CodecError",
            ErrorCategory::ResourceLimit => "ResourceLimit",
            ErrorCategory::InternalBug => "InternalBug",
        }
    }
}

/// rasterkit error types
///
/// All errors are type-safe and provide clear, actionable messages.
#[derive(Debug, Error)]
pub enum RasterError {
    // File I/O Errors
    #[error("File not found: {path}")]
    FileNotFound { path: Cow<'static, str> },

    #[error("Failed to read file '{path}': {source}")]
    FileReadFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWriteFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    // Codec Errors
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: Cow<'static, str> },

    #[error("Failed to decode image: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    #[error("No EXIF metadata found in '{path}'")]
    MetadataNotFound { path: Cow<'static, str> },

    #[error("Decoded image '{path}' contains no pixel data")]
    EmptyImage { path: Cow<'static, str> },

    #[error("Failed to encode as {format}: {message}")]
    EncodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    #[error("Resize failed ({source_width}x{source_height} -> {target_width}x{target_height}): {message}")]
    ResizeFailed {
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
        message: Cow<'static, str>,
    },

    // Resource Errors
    #[error("Memory allocation failed ({bytes} bytes)")]
    AllocationFailed { bytes: usize },

    #[error("Image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u64, max: u32 },

    #[error("Image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    // Geometry Errors
    #[error("Crop rectangle ({x}, {y}, {width}x{height}) is outside image bounds ({img_width}x{img_height})")]
    InvalidCropBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        img_width: u32,
        img_height: u32,
    },

    #[error("Invalid dimensions: width={width}, height={height}. Width and height must be positive")]
    InvalidDimensions { width: i64, height: i64 },

    // Argument Errors
    #[error("Unsupported channel count: {channels}. Expected 1, 3 or 4")]
    InvalidChannelCount { channels: u32 },

    #[error("Invalid value for {name}: {value}. {reason}")]
    InvalidArgument {
        name: Cow<'static, str>,
        value: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    // Internal Errors
    #[error("Failed to start worker pool: {message}")]
    ExecutorFailed { message: Cow<'static, str> },

    #[error("Internal error: {message}")]
    InternalPanic { message: Cow<'static, str> },
}

// Constructor Helpers
impl RasterError {
    pub fn file_not_found(path: impl Into<Cow<'static, str>>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn file_read_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn file_write_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileWriteFailed {
            path: path.into(),
            source,
        }
    }

    pub fn unsupported_format(format: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn metadata_not_found(path: impl Into<Cow<'static, str>>) -> Self {
        Self::MetadataNotFound { path: path.into() }
    }

    pub fn empty_image(path: impl Into<Cow<'static, str>>) -> Self {
        Self::EmptyImage { path: path.into() }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn resize_failed(
        source_dims: (u32, u32),
        target_dims: (u32, u32),
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::ResizeFailed {
            source_width: source_dims.0,
            source_height: source_dims.1,
            target_width: target_dims.0,
            target_height: target_dims.1,
            message: message.into(),
        }
    }

    pub fn allocation_failed(bytes: usize) -> Self {
        Self::AllocationFailed { bytes }
    }

    pub fn dimension_exceeds_limit(dimension: u64, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn invalid_crop_bounds(
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        img_width: u32,
        img_height: u32,
    ) -> Self {
        Self::InvalidCropBounds {
            x,
            y,
            width,
            height,
            img_width,
            img_height,
        }
    }

    pub fn invalid_dimensions(width: i64, height: i64) -> Self {
        Self::InvalidDimensions { width, height }
    }

    pub fn invalid_channel_count(channels: u32) -> Self {
        Self::InvalidChannelCount { channels }
    }

    pub fn invalid_argument(
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn executor_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::ExecutorFailed {
            message: message.into(),
        }
    }

    pub fn internal_panic(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InternalPanic {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (caller can fix it)
    ///
    /// Consistent with category(): user, geometry, I/O and resource errors
    /// are recoverable; codec and internal errors are not.
    pub fn is_recoverable(&self) -> bool {
        match self.category() {
            ErrorCategory::UserError
            | ErrorCategory::InvalidGeometry
            | ErrorCategory::IoError
            | ErrorCategory::ResourceLimit => true,
            ErrorCategory::CodecError | ErrorCategory::InternalBug => false,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidChannelCount { .. } | Self::InvalidArgument { .. } => {
                ErrorCategory::UserError
            }

            Self::InvalidCropBounds { .. } | Self::InvalidDimensions { .. } => {
                ErrorCategory::InvalidGeometry
            }

            Self::FileNotFound { .. }
            | Self::FileReadFailed { .. }
            | Self::FileWriteFailed { .. }
            | Self::EmptyImage { .. } => ErrorCategory::IoError,

            Self::UnsupportedFormat { .. }
            | Self::DecodeFailed { .. }
            | Self::MetadataNotFound { .. }
            | Self::EncodeFailed { .. }
            | Self::ResizeFailed { .. } => ErrorCategory::CodecError,

            Self::AllocationFailed { .. }
            | Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. } => ErrorCategory::ResourceLimit,

            Self::ExecutorFailed { .. } | Self::InternalPanic { .. } => ErrorCategory::InternalBug,
        }
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, RasterError>;

/// Success flag plus optional message: the shape every public operation
/// reports to callers that do not want to match on [`RasterError`].
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T = ()> {
    pub success: bool,
    pub value: Option<T>,
    pub message: Option<String>,
    pub category: Option<ErrorCategory>,
}

impl<T> Outcome<T> {
    pub fn ok(value: T) -> Self {
        Self {
            success: true,
            value: Some(value),
            message: None,
            category: None,
        }
    }

    pub fn failed(err: &RasterError) -> Self {
        Self {
            success: false,
            value: None,
            message: Some(err.to_string()),
            category: Some(err.category()),
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::ok(value),
            Err(err) => Outcome::failed(&err),
        }
    }
}
