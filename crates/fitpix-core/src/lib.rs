//! fitpix-core: Pure resize, recompress, and preset logic (sans-IO).
//!
//! Shrinks an image to fit maximum dimensions, then re-encodes it while
//! searching for an encoder quality that fits a byte budget:
//! decode -> plan -> resize -> quality search -> optional shrink rounds.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and a pluggable key-value backend for settings. All
//! browser/filesystem interaction lives in `fitpix-io` and `fitpix-cli`.

pub mod decode;
pub mod encode;
pub mod naming;
pub mod plan;
pub mod preset;
pub mod search;
pub mod settings;
pub mod types;

pub use encode::{Encoder, RasterEncoder, ResizeFilter};
pub use naming::{format_megabytes, mime_type_for, output_filename};
pub use preset::Preset;
pub use search::{QUALITY_FLOOR, SearchOutcome};
pub use settings::{KeyValueStore, MemoryStore, SettingsError, SettingsStore};
pub use types::{
    BYTES_PER_MEGABYTE, Dimensions, OutputFormat, ProcessConfig, ProcessError, ProcessResult, ProcessingOptions,
    Refinement, megabytes_to_bytes,
};

/// Headroom applied on top of the size-ratio estimate when shrinking,
/// since encoded size is not exactly proportional to pixel count.
const SHRINK_HEADROOM: f64 = 0.95;

/// Resize and recompress an image to fit `options`.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP, GIF) and produces a
/// [`ProcessResult`] holding the encoded output and what it took to get
/// there. Uses [`RasterEncoder`].
///
/// # Steps
///
/// 1. Validate options
/// 2. Decode and read natural dimensions
/// 3. Plan target dimensions (never upscaling)
/// 4. Resample to the target
/// 5. Quality search against `options.max_file_size`
/// 6. Optional geometric shrink rounds ([`Refinement::GeometricShrink`])
///
/// Missing the byte budget is not an error: the result is the
/// floor-quality encode with `within_budget == false`.
///
/// # Errors
///
/// Returns [`ProcessError::InvalidOptions`] if `options` fail validation.
/// Returns [`ProcessError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`ProcessError::InvalidImage`] if the image cannot be decoded.
/// Returns [`ProcessError::EncodeFailure`] if the encoder fails.
pub fn process(
    image_bytes: &[u8],
    options: &ProcessingOptions,
    config: &ProcessConfig,
) -> Result<ProcessResult, ProcessError> {
    process_with_encoder(image_bytes, options, config, &RasterEncoder)
}

/// [`process`] with a caller-supplied [`Encoder`].
///
/// # Errors
///
/// Same as [`process`].
pub fn process_with_encoder<E: Encoder + ?Sized>(
    image_bytes: &[u8],
    options: &ProcessingOptions,
    config: &ProcessConfig,
    encoder: &E,
) -> Result<ProcessResult, ProcessError> {
    // 1. Validate.
    options.validate()?;

    // 2. Decode.
    let image = decode::decode(image_bytes)?;
    let original = decode::dimensions_of(&image);

    // 3. Plan.
    let mut target = plan::plan(original, options.max_dimensions())?;

    let format = options.effective_format();
    let initial_quality = options.effective_quality();
    // Lossless encoders ignore quality, so one attempt says it all.
    let floor_quality = if format.is_lossy() {
        QUALITY_FLOOR
    } else {
        initial_quality
    };
    let budget = options.max_file_size;

    log::info!(
        "processing {original} image -> {target} {format}, budget {budget} bytes"
    );

    let mut attempts = 0;
    let mut rounds = 0;
    loop {
        // 4. Resample.
        let resized = encode::resize(&image, target, config.filter);
        let source = resized.as_ref().unwrap_or(&image);

        // 5. Quality search.
        let outcome = search::search(
            |quality| encoder.encode(source, format, quality),
            initial_quality,
            floor_quality,
            budget,
        )?;
        attempts += outcome.attempts;

        // 6. Optional shrink round.
        let next = match config.refinement {
            Refinement::GeometricShrink { max_rounds }
                if !outcome.within_budget && rounds < max_rounds =>
            {
                shrink_to_budget(target, outcome.size(), budget)
            }
            _ => None,
        };

        if let Some(smaller) = next {
            rounds += 1;
            log::info!(
                "{} bytes still over budget; shrinking {target} -> {smaller} (round {rounds})",
                outcome.size()
            );
            target = smaller;
            continue;
        }

        return Ok(ProcessResult {
            bytes: outcome.bytes,
            format,
            original,
            output: target,
            quality: outcome.quality,
            attempts,
            within_budget: outcome.within_budget,
        });
    }
}

/// Estimate dimensions whose encode would fit `budget`, assuming size
/// scales with pixel count.
///
/// Returns `None` when no further shrink is possible.
fn shrink_to_budget(current: Dimensions, size: u64, budget: u64) -> Option<Dimensions> {
    if size == 0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let scale = (budget as f64 / size as f64).sqrt() * SHRINK_HEADROOM;
    let side = |v: u32| -> u32 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let scaled = (f64::from(v) * scale).floor() as u32;
        scaled.clamp(1, v)
    };
    let next = Dimensions::new(side(current.width), side(current.height));
    (next != current).then_some(next)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn encode_png(img: &image::RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
        buf
    }

    fn gradient_png(width: u32, height: u32) -> Vec<u8> {
        #[allow(clippy::cast_possible_truncation)]
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        encode_png(&img)
    }

    /// Encoder whose output size is a 100-byte header plus
    /// `pixels * quality` bytes, recording each call.
    #[derive(Default)]
    struct ScriptedEncoder {
        calls: RefCell<Vec<(Dimensions, f32)>>,
    }

    impl Encoder for ScriptedEncoder {
        fn encode(
            &self,
            image: &image::DynamicImage,
            _format: OutputFormat,
            quality: f32,
        ) -> Result<Vec<u8>, ProcessError> {
            let dims = decode::dimensions_of(image);
            self.calls.borrow_mut().push((dims, quality));
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
            let len = (f64::from(dims.width * dims.height) * f64::from(quality)) as usize;
            Ok(vec![0; 100 + len])
        }
    }

    struct FailingEncoder;

    impl Encoder for FailingEncoder {
        fn encode(
            &self,
            _image: &image::DynamicImage,
            _format: OutputFormat,
            _quality: f32,
        ) -> Result<Vec<u8>, ProcessError> {
            Err(ProcessError::EncodeFailure("no data".into()))
        }
    }

    fn jpeg_options(budget: u64, max: u32) -> ProcessingOptions {
        ProcessingOptions::new(budget, max, max, 0.9, OutputFormat::Jpeg)
    }

    #[test]
    fn process_empty_input() {
        let result = process(&[], &ProcessingOptions::default(), &ProcessConfig::default());
        assert!(matches!(result, Err(ProcessError::EmptyInput)));
    }

    #[test]
    fn process_corrupt_input() {
        let result = process(
            &[0xFF, 0x00],
            &ProcessingOptions::default(),
            &ProcessConfig::default(),
        );
        assert!(matches!(result, Err(ProcessError::InvalidImage(_))));
    }

    #[test]
    fn process_rejects_invalid_options_before_decoding() {
        let opts = ProcessingOptions {
            max_file_size: 0,
            ..ProcessingOptions::default()
        };
        let result = process(&[], &opts, &ProcessConfig::default());
        assert!(matches!(result, Err(ProcessError::InvalidOptions(_))));
    }

    #[test]
    fn small_png_passes_through_at_natural_size() {
        let png = gradient_png(40, 30);
        let result = process(&png, &ProcessingOptions::default(), &ProcessConfig::default()).unwrap();
        assert_eq!(result.original, Dimensions::new(40, 30));
        assert_eq!(result.output, Dimensions::new(40, 30));
        assert_eq!(result.format, OutputFormat::Png);
        assert!(result.within_budget);
        assert_eq!(result.attempts, 1);
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!(decoded.width(), 40);
    }

    #[test]
    fn large_image_is_shrunk_to_limits() {
        let png = gradient_png(400, 300);
        let opts = jpeg_options(10_000_000, 200);
        let result = process(&png, &opts, &ProcessConfig::default()).unwrap();
        assert_eq!(result.output, Dimensions::new(200, 150));
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 150));
        assert_eq!(&result.bytes[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn quality_search_runs_against_budget() {
        let png = gradient_png(100, 100);
        let encoder = ScriptedEncoder::default();
        // 10_000 px: 0.9 -> 9100, ..., 0.5 -> 5100 fits.
        let result = process_with_encoder(
            &png,
            &jpeg_options(5_100, 1000),
            &ProcessConfig::default(),
            &encoder,
        )
        .unwrap();
        assert!(result.within_budget);
        assert!((result.quality - 0.5).abs() < 1e-4);
        assert_eq!(result.attempts, 5);
    }

    #[test]
    fn png_is_encoded_once_even_over_budget() {
        let png = gradient_png(50, 50);
        let encoder = ScriptedEncoder::default();
        let opts = ProcessingOptions::new(10, 1000, 1000, 0.9, OutputFormat::Png);
        let result =
            process_with_encoder(&png, &opts, &ProcessConfig::default(), &encoder).unwrap();
        assert!(!result.within_budget);
        assert_eq!(result.attempts, 1);
        assert_eq!(encoder.calls.borrow().len(), 1);
    }

    #[test]
    fn budget_miss_is_best_effort_without_refinement() {
        let png = gradient_png(100, 100);
        let encoder = ScriptedEncoder::default();
        let result = process_with_encoder(
            &png,
            &jpeg_options(100, 1000),
            &ProcessConfig::default(),
            &encoder,
        )
        .unwrap();
        assert!(!result.within_budget);
        assert!((result.quality - QUALITY_FLOOR).abs() < 1e-4);
        assert_eq!(result.output, Dimensions::new(100, 100));
        assert_eq!(result.attempts, 9);
    }

    #[test]
    fn geometric_shrink_reaches_budget() {
        let png = gradient_png(100, 100);
        let encoder = ScriptedEncoder::default();
        let config = ProcessConfig {
            refinement: Refinement::GeometricShrink { max_rounds: 3 },
            ..ProcessConfig::default()
        };
        // Floor encode at 100x100 is 1100 bytes; two shrink rounds
        // (45x45, then 38x38) bring the floor encode to 244 bytes.
        let result =
            process_with_encoder(&png, &jpeg_options(250, 1000), &config, &encoder).unwrap();
        assert!(result.within_budget, "expected budget met, got {result:?}");
        assert!(result.output.width < 100);
        assert!(result.size() <= 250);
        assert_eq!(result.output, Dimensions::new(38, 38));
        assert_eq!(result.attempts, 27);
    }

    #[test]
    fn geometric_shrink_respects_round_limit() {
        let png = gradient_png(100, 100);
        let encoder = ScriptedEncoder::default();
        let config = ProcessConfig {
            refinement: Refinement::GeometricShrink { max_rounds: 1 },
            ..ProcessConfig::default()
        };
        let result =
            process_with_encoder(&png, &jpeg_options(50, 1000), &config, &encoder).unwrap();
        assert!(!result.within_budget);
        assert_eq!(result.attempts, 18);
    }

    #[test]
    fn encoder_failure_propagates() {
        let png = gradient_png(10, 10);
        let result = process_with_encoder(
            &png,
            &ProcessingOptions::default(),
            &ProcessConfig::default(),
            &FailingEncoder,
        );
        assert!(matches!(result, Err(ProcessError::EncodeFailure(_))));
    }

    #[test]
    fn shrink_estimate() {
        let next = shrink_to_budget(Dimensions::new(1000, 500), 4_000, 1_000).unwrap();
        // sqrt(0.25) * 0.95 = 0.475
        assert!((474..=475).contains(&next.width), "{next:?}");
        assert_eq!(next.height, 237);
        assert!(shrink_to_budget(Dimensions::new(1, 1), 4_000, 1).is_none());
    }
}
