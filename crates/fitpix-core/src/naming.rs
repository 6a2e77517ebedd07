//! Download names and human-readable sizes.

use crate::types::OutputFormat;

/// Stem used when the original name has nothing before its extension.
const FALLBACK_STEM: &str = "image";

/// Suggested download name: `<original-stem>_optimized.<format>`.
///
/// Only the last extension is stripped, so `photo.holiday.JPG` becomes
/// `photo.holiday_optimized.jpeg`.
#[must_use]
pub fn output_filename(original_name: &str, format: OutputFormat) -> String {
    let stem = file_stem(original_name);
    let stem = if stem.is_empty() { FALLBACK_STEM } else { stem };
    format!("{stem}_optimized.{}", format.extension())
}

/// `name` with its last extension removed.
///
/// An extension is a dot followed by at least one character and no
/// path separator. A trailing dot is kept.
#[must_use]
pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && !ext.contains(['/', '\\']) => stem,
        _ => name,
    }
}

/// MIME type for an uploaded file, guessed from its extension.
///
/// Returns `None` for extensions the decoder is not built for.
#[must_use]
pub fn mime_type_for(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "bmp" => Some("image/bmp"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Format a byte count as mebibytes with two decimals, e.g. `"1.50MB"`.
#[must_use]
pub fn format_megabytes(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let mb = bytes as f64 / (1024.0 * 1024.0);
    format!("{mb:.2}MB")
}
