//! Resampling and re-encoding.
//!
//! [`resize`] scales a decoded raster to the planned dimensions and
//! [`Encoder`] turns it into bytes at a given format and quality.
//! [`RasterEncoder`] is the `image`-crate implementation; the trait
//! exists so the size search can be exercised with a scripted encoder.

use std::fmt;
use std::io::Cursor;

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use serde::{Deserialize, Serialize};

use crate::decode::dimensions_of;
use crate::types::{Dimensions, OutputFormat, ProcessError};

/// Resampling filter used when shrinking.
///
/// Ordered from fastest/lowest-quality to slowest/highest-quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeFilter {
    /// Nearest-neighbor: fastest, blocky artifacts.
    Nearest,
    /// Bilinear interpolation: fast, close to what browsers use for
    /// canvas scaling.
    #[default]
    Triangle,
    /// Bicubic (Catmull-Rom): moderate speed, good quality.
    CatmullRom,
    /// Gaussian: moderate speed, smooth output.
    Gaussian,
    /// Lanczos with 3 lobes: slowest, sharpest/best for photos.
    Lanczos3,
}

impl ResizeFilter {
    /// Convert to the `image` crate's `FilterType`.
    const fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Triangle => image::imageops::FilterType::Triangle,
            Self::CatmullRom => image::imageops::FilterType::CatmullRom,
            Self::Gaussian => image::imageops::FilterType::Gaussian,
            Self::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("Nearest"),
            Self::Triangle => f.write_str("Triangle"),
            Self::CatmullRom => f.write_str("CatmullRom"),
            Self::Gaussian => f.write_str("Gaussian"),
            Self::Lanczos3 => f.write_str("Lanczos3"),
        }
    }
}

/// Resample `image` to exactly `target`.
///
/// Returns `None` when `target` already equals the image size, so
/// callers can keep using the original without a copy.
#[must_use]
pub fn resize(image: &DynamicImage, target: Dimensions, filter: ResizeFilter) -> Option<DynamicImage> {
    if dimensions_of(image) == target {
        return None;
    }
    Some(image.resize_exact(target.width, target.height, filter.to_image_filter()))
}

/// Something that turns a raster into encoded bytes.
pub trait Encoder {
    /// Encode `image` as `format`. `quality` is a fraction in `(0, 1]`
    /// and is ignored by lossless formats.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::EncodeFailure`] if encoding fails or
    /// produces no data.
    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: f32,
    ) -> Result<Vec<u8>, ProcessError>;
}

/// [`Encoder`] backed by the `image` crate's PNG and JPEG codecs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterEncoder;

impl Encoder for RasterEncoder {
    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: f32,
    ) -> Result<Vec<u8>, ProcessError> {
        let mut buf = Cursor::new(Vec::new());

        match format {
            OutputFormat::Png => {
                let encoder = PngEncoder::new(&mut buf);
                image.write_with_encoder(encoder).map_err(|e| {
                    ProcessError::EncodeFailure(format!("PNG encode failed: {e}"))
                })?;
            }
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel.
                let encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality));
                image.to_rgb8().write_with_encoder(encoder).map_err(|e| {
                    ProcessError::EncodeFailure(format!("JPEG encode failed: {e}"))
                })?;
            }
        }

        let bytes = buf.into_inner();
        if bytes.is_empty() {
            return Err(ProcessError::EncodeFailure(format!(
                "{format} encoder produced no data"
            )));
        }
        Ok(bytes)
    }
}

/// Map a `(0, 1]` quality fraction onto the JPEG encoder's `1..=100`.
#[must_use]
pub fn jpeg_quality(quality: f32) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let q = (quality.clamp(0.0, 1.0) * 100.0).round() as u8;
    q.max(1)
}
