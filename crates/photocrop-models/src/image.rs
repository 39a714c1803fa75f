use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum accepted upload size (20 MiB).
pub const MAX_FILE_SIZE: usize = 20 * 1024 * 1024;

/// MIME types accepted for upload.
pub const SUPPORTED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/heic", "image/webp"];

/// Container format sniffed from image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Heic,
    Gif,
    Bmp,
    Tiff,
}

impl ImageFormat {
    /// Short lowercase name, e.g. `"jpeg"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Heic => "heic",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Heic => "image/heic",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Tiff => "image/tiff",
        }
    }

    /// Whether uploads in this format are accepted.
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Webp | ImageFormat::Heic
        )
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header-level information about an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub color_space: String,
    /// Pixel density in DPI
    pub density: u32,
    /// Size in bytes
    pub size: usize,
}

impl ImageMetadata {
    /// DPI assumed when the file carries none.
    pub const DEFAULT_DENSITY: u32 = 72;

    /// Metadata with every field defaulted except the byte size.
    pub fn unknown(size: usize) -> Self {
        Self {
            width: 0,
            height: 0,
            format: "unknown".to_string(),
            color_space: "unknown".to_string(),
            density: Self::DEFAULT_DENSITY,
            size,
        }
    }
}

/// Reason an upload was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    EmptyFile,
    FileTooLarge,
    UnsupportedType,
    InvalidImage,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::EmptyFile => "EMPTY_FILE",
            ValidationCode::FileTooLarge => "FILE_TOO_LARGE",
            ValidationCode::UnsupportedType => "UNSUPPORTED_TYPE",
            ValidationCode::InvalidImage => "INVALID_IMAGE",
        }
    }
}

/// Outcome of upload validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ValidationCode>,
}

impl ImageValidation {
    pub fn ok(format: impl Into<String>) -> Self {
        Self {
            valid: true,
            format: Some(format.into()),
            error: None,
            code: None,
        }
    }

    pub fn rejected(code: ValidationCode, error: impl Into<String>) -> Self {
        Self {
            valid: false,
            format: None,
            error: Some(error.into()),
            code: Some(code),
        }
    }
}

/// Encoded output format for print files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
        }
    }
}

/// Options for print optimisation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PrintOptions {
    pub target_dpi: u32,
    pub max_width: u32,
    pub max_height: u32,
    /// Encoder quality (1-100), ignored by lossless formats
    pub quality: u8,
    pub format: OutputFormat,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            target_dpi: 300,
            // A3-ish ceiling at 300 DPI
            max_width: 4200,
            max_height: 5940,
            quality: 90,
            format: OutputFormat::Jpeg,
        }
    }
}

/// A-series paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrintSize {
    A5,
    A4,
    A3,
    A2,
}

impl PrintSize {
    pub const ALL: [PrintSize; 4] = [PrintSize::A5, PrintSize::A4, PrintSize::A3, PrintSize::A2];

    /// Pixel dimensions `(width, height)` at 300 DPI, portrait.
    pub fn pixels_at_300_dpi(&self) -> (u32, u32) {
        match self {
            PrintSize::A5 => (1748, 2480),
            PrintSize::A4 => (2480, 3508),
            PrintSize::A3 => (3508, 4960),
            PrintSize::A2 => (4960, 7016),
        }
    }
}

impl fmt::Display for PrintSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrintSize::A5 => "A5",
            PrintSize::A4 => "A4",
            PrintSize::A3 => "A3",
            PrintSize::A2 => "A2",
        };
        f.write_str(s)
    }
}
