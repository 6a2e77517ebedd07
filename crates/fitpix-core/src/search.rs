//! Quality search against a byte-size budget.
//!
//! Walks the encoder quality down in fixed steps until the encoded
//! output fits the budget or the quality floor is reached. The search
//! is linear rather than binary: it does not find the highest quality
//! that fits, but it is deterministic and bounded by [`MAX_ATTEMPTS`]
//! encodes regardless of image content.
//!
//! The budget is a soft target. When even the floor-quality encode is
//! too large, that encode is returned anyway and
//! [`SearchOutcome::within_budget`] is `false`.

/// Lowest quality the search will try.
pub const QUALITY_FLOOR: f32 = 0.1;

/// Amount the quality drops between attempts.
pub const QUALITY_STEP: f32 = 0.1;

/// Upper bound on encodes per search (0.9 down to 0.1 in steps of 0.1).
pub const MAX_ATTEMPTS: u32 = 9;

/// Qualities are tracked in hundredths so repeated subtraction cannot
/// drift below the floor or produce an extra attempt.
const STEP_HUNDREDTHS: u32 = 10;

/// The encode the search settled on.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Encoded bytes of the final attempt.
    pub bytes: Vec<u8>,
    /// Quality used for the final attempt.
    pub quality: f32,
    /// Number of encodes performed.
    pub attempts: u32,
    /// Whether `bytes` fits the budget.
    pub within_budget: bool,
}

impl SearchOutcome {
    /// Size of the final encode in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Search for a quality whose encode fits in `budget` bytes.
///
/// Starts at `initial_quality` and steps down by [`QUALITY_STEP`],
/// clamped at `floor_quality`. Stops at the first encode that fits, at
/// the floor, or after [`MAX_ATTEMPTS`] encodes. If the attempt cap is
/// about to be reached before the floor (initial qualities above 0.9),
/// the last attempt uses the floor directly. An initial quality at or
/// below the floor is encoded exactly once.
///
/// Qualities are rounded to hundredths.
///
/// # Errors
///
/// Returns the first error produced by `encode`. Missing the budget is
/// never an error.
pub fn search<F, E>(
    mut encode: F,
    initial_quality: f32,
    floor_quality: f32,
    budget: u64,
) -> Result<SearchOutcome, E>
where
    F: FnMut(f32) -> Result<Vec<u8>, E>,
{
    let floor = to_hundredths(floor_quality);
    let mut current = to_hundredths(initial_quality);
    let mut attempts = 0;

    loop {
        attempts += 1;
        let quality = from_hundredths(current);
        let bytes = encode(quality)?;
        let size = bytes.len() as u64;
        let within_budget = size <= budget;

        log::debug!(
            "attempt {attempts}: quality {quality:.2} -> {size} bytes (budget {budget})"
        );

        if within_budget || current <= floor || attempts >= MAX_ATTEMPTS {
            if within_budget {
                log::info!("final quality {quality:.2}, size {size} bytes");
            } else {
                log::info!(
                    "final quality {quality:.2}, size {size} bytes exceeds budget of {budget} bytes"
                );
            }
            return Ok(SearchOutcome {
                bytes,
                quality,
                attempts,
                within_budget,
            });
        }

        current = if attempts + 1 >= MAX_ATTEMPTS {
            floor
        } else {
            current.saturating_sub(STEP_HUNDREDTHS).max(floor)
        };
    }
}

/// Never returns 0: a positive quality below 0.005 still encodes at 0.01.
fn to_hundredths(quality: f32) -> u32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let hundredths = (quality.clamp(0.0, 1.0) * 100.0).round() as u32;
    hundredths.max(1)
}

#[allow(clippy::cast_precision_loss)]
fn from_hundredths(hundredths: u32) -> f32 {
    hundredths as f32 / 100.0
}
