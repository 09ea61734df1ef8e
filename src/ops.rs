// src/ops.rs
//
// Pipeline operations.
// These are cheap to create and store - the pixel work happens in apply_ops().

use std::path::Path;

/// RGB drawing color. Single-channel buffers receive its luma instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from loosely typed channel values, clamping each to 0..=255.
    pub fn clamped(r: i32, g: i32, b: i32) -> Self {
        let c = |v: i32| v.clamp(0, 255) as u8;
        Self::rgb(c(r), c(g), c(b))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::RED
    }
}

/// Smoothing strategy for [`Operation::Blur`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlurKind {
    Gaussian,
    Median,
    /// Uniform 3x3 kernel run through the 5x5 convolution path.
    Average,
}

impl BlurKind {
    /// Parse a blur name. Anything that is not `gaussian` or `median`
    /// selects the averaging kernel; this is not an error.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "gaussian" => BlurKind::Gaussian,
            "median" => BlurKind::Median,
            other => {
                if other != "average" {
                    tracing::debug!(kind = other, "unknown blur kind, using average kernel");
                }
                BlurKind::Average
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlurKind::Gaussian => "gaussian",
            BlurKind::Median => "median",
            BlurKind::Average => "average",
        }
    }
}

/// Image operations that can be chained in memory.
///
/// Each operation is self-contained: it consumes one buffer and yields one.
/// Geometry is in integer pixels, exactly as callers pass it.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    /// Luma conversion (single-channel output)
    Grayscale,

    /// Resample to an exact size
    Resize { width: i32, height: i32 },

    /// Crop a region from the image
    Crop { x: i32, y: i32, width: i32, height: i32 },

    /// Rotate by an arbitrary angle in degrees, growing the canvas
    Rotate { degrees: f32 },

    /// Smooth with the given kernel family
    Blur { kind: BlurKind, size: usize, sigma: f32 },

    /// Sobel gradient magnitude
    Sobel,

    /// Smoothing + high-threshold edge map (`low` is accepted but unused)
    Canny { low: f32, high: f32 },

    /// Fixed global threshold
    Threshold { thresh: i32, maxval: i32 },

    /// Automatic global threshold
    Otsu,

    /// Local mean threshold
    AdaptiveThreshold { block_size: i32, c: i32 },

    Erode { size: usize },
    Dilate { size: usize },
    /// Erode then dilate
    Open { size: usize },
    /// Dilate then erode
    Close { size: usize },

    DrawLine {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: Color,
        thickness: i32,
    },
    DrawRect {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Color,
        thickness: i32,
    },
    FillRect {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Color,
    },
    DrawCircle {
        cx: i32,
        cy: i32,
        radius: i32,
        color: Color,
        thickness: i32,
    },
    DrawText {
        x: i32,
        y: i32,
        text: String,
        color: Color,
        scale: i32,
    },
}

impl Operation {
    /// Default blur: gaussian, 5x5, sigma 1.5
    pub fn blur() -> Self {
        Operation::Blur {
            kind: BlurKind::Gaussian,
            size: 5,
            sigma: 1.5,
        }
    }

    /// Default edge map: low 50, high 150
    pub fn canny() -> Self {
        Operation::Canny {
            low: 50.0,
            high: 150.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Grayscale => "grayscale",
            Operation::Resize { .. } => "resize",
            Operation::Crop { .. } => "crop",
            Operation::Rotate { .. } => "rotate",
            Operation::Blur { .. } => "blur",
            Operation::Sobel => "sobel",
            Operation::Canny { .. } => "canny",
            Operation::Threshold { .. } => "threshold",
            Operation::Otsu => "otsu",
            Operation::AdaptiveThreshold { .. } => "adaptive_threshold",
            Operation::Erode { .. } => "erode",
            Operation::Dilate { .. } => "dilate",
            Operation::Open { .. } => "open",
            Operation::Close { .. } => "close",
            Operation::DrawLine { .. } => "draw_line",
            Operation::DrawRect { .. } => "draw_rect",
            Operation::FillRect { .. } => "fill_rect",
            Operation::DrawCircle { .. } => "draw_circle",
            Operation::DrawText { .. } => "draw_text",
        }
    }
}

/// Output format for encoding, inferred from the destination path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg { quality: u8 },
    Png,
    Bmp,
}

impl OutputFormat {
    pub fn from_extension(ext: &str, quality: u8) -> Result<Self, String> {
        match ext.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg { quality }),
            "png" => Ok(Self::Png),
            "bmp" => Ok(Self::Bmp),
            other => Err(format!("unsupported output extension: .{other}")),
        }
    }

    pub fn from_path(path: &Path, quality: u8) -> Result<Self, String> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| format!("output path has no extension: {}", path.display()))?;
        Self::from_extension(ext, quality)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg { .. } => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Bmp => "bmp",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_blur_kind_falls_back_to_average() {
        assert_eq!(BlurKind::parse("gaussian"), BlurKind::Gaussian);
        assert_eq!(BlurKind::parse("MEDIAN"), BlurKind::Median);
        assert_eq!(BlurKind::parse("average"), BlurKind::Average);
        assert_eq!(BlurKind::parse("bilateral"), BlurKind::Average);
    }

    #[test]
    fn output_format_from_path() {
        assert_eq!(
            OutputFormat::from_path(Path::new("a/b.JPG"), 95),
            Ok(OutputFormat::Jpeg { quality: 95 })
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("out.png"), 95),
            Ok(OutputFormat::Png)
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("out.bmp"), 95),
            Ok(OutputFormat::Bmp)
        );
        assert!(OutputFormat::from_path(Path::new("out.tga"), 95).is_err());
        assert!(OutputFormat::from_path(Path::new("noext"), 95).is_err());
    }

    #[test]
    fn color_clamps_channels() {
        assert_eq!(Color::clamped(-5, 128, 300), Color::rgb(0, 128, 255));
    }
}
