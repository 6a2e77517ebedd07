//! fitpix-cli: resize and recompress images from the command line.
//!
//! Shares the presets and settings records of the web app, persisted in
//! a JSON file instead of browser storage.
//!
//! # Usage
//!
//! ```text
//! fitpix-cli optimize photo.jpg --preset "Web Optimized"
//! fitpix-cli presets
//! fitpix-cli use "Social Media"
//! fitpix-cli custom --max-file-size-mb 0.5 --max-width 800 --format jpeg
//! fitpix-cli show
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod store;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use fitpix_core::preset::{self, CUSTOM};
use fitpix_core::{
    KeyValueStore, OutputFormat, ProcessConfig, ProcessError, ProcessResult, ProcessingOptions,
    Refinement, ResizeFilter, SettingsError, SettingsStore, format_megabytes, megabytes_to_bytes,
    output_filename,
};
use serde::Serialize;
use web_time::Instant;

use crate::store::{JsonFileStore, StoreError};

/// Default settings file, relative to the working directory.
const DEFAULT_SETTINGS_FILE: &str = "fitpix-settings.json";

/// Resize and recompress images to fit a file size limit.
#[derive(Parser)]
#[command(name = "fitpix-cli", version)]
struct Cli {
    /// Settings file holding the active preset and custom options.
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    /// Log debug detail, including every encode attempt.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Optimize one image with the active options or a named preset.
    Optimize {
        /// Path to the input image (PNG, JPEG, BMP, WebP, GIF).
        image: PathBuf,

        /// Use this preset for this run without changing the active one.
        #[arg(long)]
        preset: Option<String>,

        /// Output path. Defaults to `<stem>_optimized.<format>` next to
        /// the input.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Shrink dimensions up to this many extra rounds when the
        /// quality search alone cannot meet the size limit.
        #[arg(long, default_value_t = 0)]
        shrink_rounds: u32,

        /// Resampling filter used when shrinking.
        #[arg(long, value_enum, default_value_t = Filter::Triangle)]
        filter: Filter,

        /// Print a JSON report instead of text.
        #[arg(long)]
        json: bool,
    },

    /// List presets, marking the active one.
    Presets,

    /// Make a preset active.
    Use {
        /// Preset name, e.g. "Web Optimized".
        name: String,
    },

    /// Edit the Custom preset and make it active.
    Custom {
        /// Size limit in megabytes (1 MB = 1,000,000 bytes).
        #[arg(long)]
        max_file_size_mb: Option<f64>,

        /// Maximum width in pixels.
        #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
        max_width: Option<u32>,

        /// Maximum height in pixels.
        #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
        max_height: Option<u32>,

        /// Starting quality in (0, 1].
        #[arg(long)]
        quality: Option<f32>,

        /// Output format (png, jpeg, jpg).
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Print the active preset and options.
    Show,
}

/// Resampling filter selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Filter {
    /// Nearest-neighbor (fastest, blocky).
    Nearest,
    /// Bilinear interpolation (fast, decent quality).
    Triangle,
    /// Bicubic Catmull-Rom (moderate, good quality).
    CatmullRom,
    /// Gaussian (moderate, smooth).
    Gaussian,
    /// Lanczos with 3 lobes (slowest, sharpest).
    Lanczos3,
}

impl From<Filter> for ResizeFilter {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Nearest => Self::Nearest,
            Filter::Triangle => Self::Triangle,
            Filter::CatmullRom => Self::CatmullRom,
            Filter::Gaussian => Self::Gaussian,
            Filter::Lanczos3 => Self::Lanczos3,
        }
    }
}

/// Everything that can stop a command.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encoding report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("invalid size limit: {0} MB")]
    InvalidSize(f64),
}

/// Machine-readable summary printed by `optimize --json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    input: PathBuf,
    output: PathBuf,
    format: OutputFormat,
    original_width: u32,
    original_height: u32,
    original_size: u64,
    width: u32,
    height: u32,
    size: u64,
    quality: f32,
    attempts: u32,
    within_budget: bool,
    elapsed_ms: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut settings = SettingsStore::new(JsonFileStore::open(&cli.settings)?);

    match cli.command {
        Command::Optimize {
            image,
            preset,
            output,
            shrink_rounds,
            filter,
            json,
        } => {
            let options = match preset {
                Some(name) => preset_options(&mut settings, &name)?,
                None => settings.get_active_options()?,
            };
            let config = ProcessConfig {
                filter: filter.into(),
                refinement: if shrink_rounds > 0 {
                    Refinement::GeometricShrink {
                        max_rounds: shrink_rounds,
                    }
                } else {
                    Refinement::None
                },
            };
            optimize(&image, output, &options, &config, json)
        }
        Command::Presets => {
            let active = settings.get_active_preset_name()?;
            for p in settings.list_presets() {
                let marker = if p.name == active { '*' } else { ' ' };
                println!("{marker} {} - {}", p.name, p.description);
            }
            Ok(())
        }
        Command::Use { name } => {
            let options = settings.apply_preset(&name)?;
            println!("Active preset: {name}");
            println!("{}", describe(&options));
            Ok(())
        }
        Command::Custom {
            max_file_size_mb,
            max_width,
            max_height,
            quality,
            format,
        } => {
            let mut options = settings.get_custom_preset()?;
            if let Some(mb) = max_file_size_mb {
                options.max_file_size = megabytes_to_bytes(mb).ok_or(CliError::InvalidSize(mb))?;
            }
            if let Some(w) = max_width {
                options.max_width = w;
            }
            if let Some(h) = max_height {
                options.max_height = h;
            }
            if quality.is_some() {
                options.quality = quality;
            }
            if format.is_some() {
                options.format = format;
            }
            settings.save_custom_options(&options)?;
            println!("Active preset: {CUSTOM}");
            println!("{}", describe(&options));
            Ok(())
        }
        Command::Show => {
            let name = settings.get_active_preset_name()?;
            let options = settings.get_active_options()?;
            println!("Active preset: {name}");
            println!("{}", describe(&options));
            println!("Settings file: {}", settings.backend().path().display());
            Ok(())
        }
    }
}

/// Options of the preset called `name`, without making it active.
fn preset_options<S: KeyValueStore>(
    settings: &mut SettingsStore<S>,
    name: &str,
) -> Result<ProcessingOptions, SettingsError> {
    if name == CUSTOM {
        return settings.get_custom_preset();
    }
    preset::find_builtin(name)
        .map(|p| p.options)
        .ok_or_else(|| SettingsError::UnknownPreset(name.to_owned()))
}

/// Multi-line human-readable rendering of an option set.
fn describe(options: &ProcessingOptions) -> String {
    format!(
        "  Max file size: {} MB ({} bytes)\n  Max dimensions: {}\n  Quality: {:.0}%\n  Format: {}",
        options.max_file_size_megabytes(),
        options.max_file_size,
        options.max_dimensions(),
        options.effective_quality() * 100.0,
        options.effective_format(),
    )
}

/// Where the output goes when `--output` is not given.
fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let name = input
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    input.with_file_name(output_filename(&name, format))
}

fn optimize(
    input: &Path,
    output: Option<PathBuf>,
    options: &ProcessingOptions,
    config: &ProcessConfig,
    json: bool,
) -> Result<(), CliError> {
    let bytes = std::fs::read(input).map_err(|source| CliError::Io {
        action: "reading",
        path: input.to_path_buf(),
        source,
    })?;
    log::info!("{}: {} bytes", input.display(), bytes.len());

    let started = Instant::now();
    let result = fitpix_core::process(&bytes, options, config)?;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    if !result.within_budget {
        log::warn!(
            "could not reach {} bytes; smallest result is {} bytes",
            options.max_file_size,
            result.size()
        );
    }

    let output = output.unwrap_or_else(|| default_output_path(input, result.format));
    std::fs::write(&output, &result.bytes).map_err(|source| CliError::Io {
        action: "writing",
        path: output.clone(),
        source,
    })?;

    if json {
        let report = report(input, output, bytes.len() as u64, &result, elapsed_ms);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Original: {}, {}",
            result.original,
            format_megabytes(bytes.len() as u64)
        );
        println!(
            "Optimized: {}, {}",
            result.output,
            format_megabytes(result.size())
        );
        println!(
            "Quality {:.2} after {} encode(s) in {elapsed_ms} ms",
            result.quality, result.attempts
        );
        println!("Wrote {}", output.display());
    }
    Ok(())
}

fn report(
    input: &Path,
    output: PathBuf,
    original_size: u64,
    result: &ProcessResult,
    elapsed_ms: u64,
) -> Report {
    Report {
        input: input.to_path_buf(),
        output,
        format: result.format,
        original_width: result.original.width,
        original_height: result.original.height,
        original_size,
        width: result.output.width,
        height: result.output.height,
        size: result.size(),
        quality: result.quality,
        attempts: result.attempts,
        within_budget: result.within_budget,
        elapsed_ms,
    }
}
