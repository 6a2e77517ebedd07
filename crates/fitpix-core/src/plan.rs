//! Target-size planning.
//!
//! Fits the natural image size inside a bounding box while keeping the
//! aspect ratio. Images that already fit are never enlarged.

use crate::types::{Dimensions, ProcessError};

/// Compute the output dimensions for an image of size `natural` that
/// must fit inside `max`.
///
/// When the image already fits, `natural` is returned unchanged.
/// Otherwise both sides are scaled by
/// `min(max.width / natural.width, max.height / natural.height)` and
/// floored, so both limits hold at once. The arithmetic is done on
/// integers, so the limiting side lands exactly on its maximum. Each
/// side is kept at least 1 px wide so extreme aspect ratios still
/// yield a drawable surface.
///
/// # Errors
///
/// Returns [`ProcessError::InvalidImage`] if `natural` has a zero side.
/// Returns [`ProcessError::InvalidOptions`] if `max` has a zero side.
pub fn plan(natural: Dimensions, max: Dimensions) -> Result<Dimensions, ProcessError> {
    if natural.is_degenerate() {
        return Err(ProcessError::InvalidImage(format!(
            "image has zero dimension ({}x{})",
            natural.width, natural.height
        )));
    }
    if max.is_degenerate() {
        return Err(ProcessError::InvalidOptions(format!(
            "maximum dimensions must be positive ({}x{})",
            max.width, max.height
        )));
    }

    if natural.fits_within(max) {
        return Ok(natural);
    }

    // Compare max.width / natural.width against max.height / natural.height
    // by cross-multiplying, so the limiting side is scaled exactly.
    let width_limited = u64::from(max.width) * u64::from(natural.height)
        <= u64::from(max.height) * u64::from(natural.width);

    let target = if width_limited {
        Dimensions::new(
            max.width,
            scale_side(natural.height, max.width, natural.width),
        )
    } else {
        Dimensions::new(
            scale_side(natural.width, max.height, natural.height),
            max.height,
        )
    };
    Ok(target)
}

/// Compute `floor(side * num / den)` in integers, clamped to `1..=side`.
///
/// Callers guarantee `num < den`, so the result never exceeds `side`.
fn scale_side(side: u32, num: u32, den: u32) -> u32 {
    let scaled = u64::from(side) * u64::from(num) / u64::from(den);
    u32::try_from(scaled).unwrap_or(side).clamp(1, side)
}
