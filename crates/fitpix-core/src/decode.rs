//! Image decoding.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP, GIF) and produces a
//! decoded raster plus its natural dimensions. This is the first step
//! of processing: raw bytes in, `DynamicImage` out.

use std::io::Cursor;

use image::{DynamicImage, ImageReader};

use crate::types::{Dimensions, ProcessError};

/// Decode raw image bytes.
///
/// # Errors
///
/// Returns [`ProcessError::EmptyInput`] if `bytes` is empty.
/// Returns [`ProcessError::InvalidImage`] if the format is unrecognized,
/// the data is corrupt, or the decoded image has a zero dimension.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ProcessError> {
    if bytes.is_empty() {
        return Err(ProcessError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)
        .map_err(|e| ProcessError::InvalidImage(e.to_string()))?;

    if dimensions_of(&img).is_degenerate() {
        return Err(ProcessError::InvalidImage(format!(
            "image has zero dimension ({}x{})",
            img.width(),
            img.height()
        )));
    }
    Ok(img)
}

/// Read the natural dimensions from the image header without decoding
/// the pixel data.
///
/// # Errors
///
/// Same as [`decode`]: [`ProcessError::EmptyInput`] for empty input,
/// [`ProcessError::InvalidImage`] for an unrecognized header or a zero
/// dimension.
pub fn probe_dimensions(bytes: &[u8]) -> Result<Dimensions, ProcessError> {
    if bytes.is_empty() {
        return Err(ProcessError::EmptyInput);
    }

    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ProcessError::InvalidImage(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ProcessError::InvalidImage(e.to_string()))?;

    let dims = Dimensions::new(width, height);
    if dims.is_degenerate() {
        return Err(ProcessError::InvalidImage(format!(
            "image has zero dimension ({width}x{height})"
        )));
    }
    Ok(dims)
}

/// Natural dimensions of a decoded image.
#[must_use]
pub fn dimensions_of(img: &DynamicImage) -> Dimensions {
    Dimensions::new(img.width(), img.height())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(decode(&[]), Err(ProcessError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_return_invalid_image() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(ProcessError::InvalidImage(_))));
    }

    fn red_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |_, _| image::Rgba([255, 0, 0, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn valid_png_decodes_with_dimensions() {
        let decoded = decode(&red_png(3, 2)).unwrap();
        assert_eq!(dimensions_of(&decoded), Dimensions::new(3, 2));
    }

    #[test]
    fn probe_reads_header_dimensions() {
        assert_eq!(probe_dimensions(&red_png(7, 4)).unwrap(), Dimensions::new(7, 4));
    }

    #[test]
    fn probe_rejects_what_decode_rejects() {
        assert!(matches!(probe_dimensions(&[]), Err(ProcessError::EmptyInput)));
        assert!(matches!(
            probe_dimensions(&[0xFF, 0xFE, 0x00, 0x01]),
            Err(ProcessError::InvalidImage(_))
        ));
    }
}
