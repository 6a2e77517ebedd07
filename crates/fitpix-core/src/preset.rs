//! Built-in presets.
//!
//! A fixed, ordered table of named option bundles. Every entry except
//! [`CUSTOM`] is a read-only template; the "Custom" entry here only
//! supplies the defaults until the user saves their own values through
//! [`SettingsStore`](crate::settings::SettingsStore).

use serde::{Deserialize, Serialize};

use crate::types::{OutputFormat, ProcessingOptions};

/// Name of the default preset.
pub const STANDARD: &str = "Standard";
/// Name of the high-quality preset.
pub const HIGH_QUALITY: &str = "High Quality";
/// Name of the web preset.
pub const WEB_OPTIMIZED: &str = "Web Optimized";
/// Name of the social media preset.
pub const SOCIAL_MEDIA: &str = "Social Media";
/// Name of the reserved, user-editable preset.
pub const CUSTOM: &str = "Custom";

/// A named, reusable bundle of processing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Unique name.
    pub name: String,
    /// One-line summary shown next to the name.
    pub description: String,
    /// The options this preset applies.
    pub options: ProcessingOptions,
}

impl Preset {
    fn builtin(name: &str, description: &str, options: ProcessingOptions) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            options,
        }
    }

    /// Whether this is the reserved, user-editable preset.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.name == CUSTOM
    }
}

/// The option set used on first run and by [`STANDARD`].
#[must_use]
pub fn default_options() -> ProcessingOptions {
    ProcessingOptions::default()
}

/// All built-in presets, in display order.
#[must_use]
pub fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset::builtin(
            STANDARD,
            "Balances quality and file size (5MB, 2000×2000px)",
            default_options(),
        ),
        Preset::builtin(
            HIGH_QUALITY,
            "Preserves quality (8MB, 3000×3000px)",
            ProcessingOptions::new(8_000_000, 3000, 3000, 0.95, OutputFormat::Png),
        ),
        Preset::builtin(
            WEB_OPTIMIZED,
            "Fast loading for web (2MB, 1200×1200px)",
            ProcessingOptions::new(2_000_000, 1200, 1200, 0.85, OutputFormat::Jpeg),
        ),
        Preset::builtin(
            SOCIAL_MEDIA,
            "Ideal for social platforms (1MB, 1080×1080px)",
            ProcessingOptions::new(1_000_000, 1080, 1080, 0.8, OutputFormat::Jpeg),
        ),
        Preset::builtin(CUSTOM, "Your personalized settings", default_options()),
    ]
}

/// Look up a built-in preset by exact name.
#[must_use]
pub fn find_builtin(name: &str) -> Option<Preset> {
    builtin_presets().into_iter().find(|p| p.name == name)
}
