//! Shared types for the fitpix resize/recompress core.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::encode::ResizeFilter;

/// Re-export `DynamicImage` so downstream crates can hold decoded
/// rasters without depending on `image` directly.
pub use image::DynamicImage;

/// Quality used when [`ProcessingOptions::quality`] is unset.
pub const DEFAULT_QUALITY: f32 = 0.9;

/// Bytes per megabyte when budgets are entered or shown in MB.
pub const BYTES_PER_MEGABYTE: u64 = 1_000_000;

/// Convert a budget entered in megabytes to bytes.
///
/// Returns `None` for non-finite or non-positive input, or when the
/// result rounds to zero bytes.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn megabytes_to_bytes(megabytes: f64) -> Option<u64> {
    if !megabytes.is_finite() || megabytes <= 0.0 {
        return None;
    }
    let bytes = (megabytes * BYTES_PER_MEGABYTE as f64).round();
    if bytes < 1.0 || bytes > u64::MAX as f64 {
        return None;
    }
    Some(bytes as u64)
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new set of dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either side is zero.
    #[must_use]
    pub const fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if both sides fit inside `bounds`.
    #[must_use]
    pub const fn fits_within(self, bounds: Self) -> bool {
        self.width <= bounds.width && self.height <= bounds.height
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}px", self.width, self.height)
    }
}

/// Output encoding.
///
/// PNG is lossless and ignores the quality parameter; JPEG honors it.
/// Stored records are read through [`FromStr`], so they accept the same
/// spellings as user input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum OutputFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// Lossy JPEG.
    Jpeg,
}

impl OutputFormat {
    /// All supported output formats, in display order.
    pub const ALL: [Self; 2] = [Self::Png, Self::Jpeg];

    /// File extension without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    /// MIME type for Blob construction and HTTP-style labelling.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Whether the encoder takes the quality parameter into account.
    #[must_use]
    pub const fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            _ => Err(ProcessError::UnsupportedFormat(s.to_owned())),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = ProcessError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// The option set in effect for one processing run.
///
/// Serialized in camelCase (`maxFileSize`, `maxWidth`, ...), the
/// layout of the persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingOptions {
    /// Byte-size budget for the encoded output. A soft target.
    #[serde(deserialize_with = "deserialize_byte_count")]
    pub max_file_size: u64,

    /// Maximum output width in pixels.
    pub max_width: u32,

    /// Maximum output height in pixels.
    pub max_height: u32,

    /// Starting encoder quality in `(0, 1]`. Defaults to
    /// [`DEFAULT_QUALITY`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f32>,

    /// Output format. Defaults to PNG when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
}

impl ProcessingOptions {
    /// Default budget: 5 MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 5_000_000;
    /// Default maximum width.
    pub const DEFAULT_MAX_WIDTH: u32 = 2000;
    /// Default maximum height.
    pub const DEFAULT_MAX_HEIGHT: u32 = 2000;

    /// Create a fully specified option set.
    #[must_use]
    pub const fn new(
        max_file_size: u64,
        max_width: u32,
        max_height: u32,
        quality: f32,
        format: OutputFormat,
    ) -> Self {
        Self {
            max_file_size,
            max_width,
            max_height,
            quality: Some(quality),
            format: Some(format),
        }
    }

    /// Maximum output dimensions as a [`Dimensions`].
    #[must_use]
    pub const fn max_dimensions(&self) -> Dimensions {
        Dimensions::new(self.max_width, self.max_height)
    }

    /// The byte budget in megabytes, for display and editing.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn max_file_size_megabytes(&self) -> f64 {
        self.max_file_size as f64 / BYTES_PER_MEGABYTE as f64
    }

    /// Quality to start the search at.
    #[must_use]
    pub fn effective_quality(&self) -> f32 {
        self.quality.unwrap_or(DEFAULT_QUALITY)
    }

    /// Format to encode with.
    #[must_use]
    pub fn effective_format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    /// Check that every numeric field is positive and quality is at
    /// most 1.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvalidOptions`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<(), ProcessError> {
        if self.max_file_size == 0 {
            return Err(ProcessError::InvalidOptions(
                "maxFileSize must be greater than zero".into(),
            ));
        }
        if self.max_width == 0 {
            return Err(ProcessError::InvalidOptions(
                "maxWidth must be greater than zero".into(),
            ));
        }
        if self.max_height == 0 {
            return Err(ProcessError::InvalidOptions(
                "maxHeight must be greater than zero".into(),
            ));
        }
        if let Some(q) = self.quality
            && !(q > 0.0 && q <= 1.0)
        {
            return Err(ProcessError::InvalidOptions(format!(
                "quality must be in (0, 1], got {q}"
            )));
        }
        Ok(())
    }
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MAX_FILE_SIZE,
            Self::DEFAULT_MAX_WIDTH,
            Self::DEFAULT_MAX_HEIGHT,
            DEFAULT_QUALITY,
            OutputFormat::Png,
        )
    }
}

/// Accept byte counts written either as integers or as floats.
///
/// Budgets edited in megabytes are stored as `megabytes * 1e6`, which
/// can land on values like `300000.00000000006`.
fn deserialize_byte_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Float(f64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Ok(n),
        Raw::Float(f) if f.is_finite() && f >= 0.0 => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Ok(f.round() as u64)
        }
        Raw::Float(f) => Err(serde::de::Error::custom(format!(
            "invalid byte count: {f}"
        ))),
    }
}

/// What to do when the quality search alone cannot meet the budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Refinement {
    /// Accept the best-effort floor-quality encode.
    #[default]
    None,
    /// Shrink the dimensions in proportion to the overshoot and search
    /// again, up to `max_rounds` times.
    GeometricShrink {
        /// Maximum number of extra shrink-and-search rounds.
        max_rounds: u32,
    },
}

/// Tuning that is not part of the persisted [`ProcessingOptions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Resampling filter used when shrinking.
    pub filter: ResizeFilter,
    /// Fallback when the budget cannot be met by quality alone.
    pub refinement: Refinement,
}

/// Result of a full resize-and-recompress run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessResult {
    /// The encoded output.
    pub bytes: Vec<u8>,

    /// Format of `bytes`.
    pub format: OutputFormat,

    /// Natural dimensions of the decoded input.
    pub original: Dimensions,

    /// Dimensions of the encoded output.
    pub output: Dimensions,

    /// Quality of the final encode.
    pub quality: f32,

    /// Total number of encodes performed, across refinement rounds.
    pub attempts: u32,

    /// Whether `bytes` fits the byte budget. `false` means the result
    /// is a best-effort encode at the quality floor.
    pub within_budget: bool,
}

impl ProcessResult {
    /// Size of the encoded output in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Errors that can occur while resizing and recompressing an image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessError {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The input could not be decoded, or has a zero dimension.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The requested output format is not recognized.
    #[error("unsupported output format: {0:?}")]
    UnsupportedFormat(String),

    /// The encoder failed or produced no data.
    #[error("encoding failed: {0}")]
    EncodeFailure(String),

    /// The processing options violate an invariant.
    #[error("invalid processing options: {0}")]
    InvalidOptions(String),
}
