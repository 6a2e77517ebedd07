//! Persisted settings and presets.
//!
//! [`SettingsStore`] owns three independent records in a key-value
//! backend:
//!
//! - the active options used for the next processing run,
//! - the user's "Custom" preset,
//! - the name of the active preset.
//!
//! Values are stored as JSON strings. The backend is pluggable through
//! [`KeyValueStore`]: [`MemoryStore`] here, browser `localStorage` in
//! `fitpix-io`, and a JSON file in `fitpix-cli`. Missing records are
//! seeded with defaults and persisted on first read.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::preset::{self, Preset};
use crate::types::{OutputFormat, ProcessError, ProcessingOptions};

/// Key for the active options record.
pub const ACTIVE_OPTIONS_KEY: &str = "image_optimizer_settings";
/// Key for the custom preset record.
pub const CUSTOM_PRESET_KEY: &str = "image_optimizer_custom_preset";
/// Key for the active preset name record.
pub const ACTIVE_PRESET_KEY: &str = "image_optimizer_active_preset";

/// Errors that can occur while reading or writing settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The storage backend failed.
    #[error("settings backend error: {0}")]
    Backend(String),

    /// A stored record could not be parsed.
    #[error("stored value for {key:?} is corrupt: {source}")]
    Corrupt {
        /// The key whose value failed to parse.
        key: String,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// No preset has the requested name.
    #[error("unknown preset: {0:?}")]
    UnknownPreset(String),

    /// Options failed validation and were not saved.
    #[error(transparent)]
    InvalidOptions(#[from] ProcessError),
}

/// A string key-value backend.
pub trait KeyValueStore {
    /// Read the value for `key`, or `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Backend`] if the backend is unavailable.
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Backend`] if the write fails.
    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// In-memory [`KeyValueStore`]. Used by tests and as a fallback when no
/// persistent backend is available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Settings and preset access over a [`KeyValueStore`].
///
/// Construct one explicitly and pass it to whatever needs it; there is
/// no global instance.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore<S> {
    backend: S,
}

impl<S: KeyValueStore> SettingsStore<S> {
    /// Wrap a backend.
    pub const fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Borrow the backend.
    pub const fn backend(&self) -> &S {
        &self.backend
    }

    /// Unwrap the backend.
    pub fn into_inner(self) -> S {
        self.backend
    }

    /// Options for the next processing run.
    ///
    /// On first run, persists and returns the Standard defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the backend fails or the stored
    /// record is corrupt.
    pub fn get_active_options(&mut self) -> Result<ProcessingOptions, SettingsError> {
        self.read_or_seed(ACTIVE_OPTIONS_KEY, preset::default_options)
    }

    /// Replace the active options.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidOptions`] without writing if
    /// `options` fail validation, or a backend error.
    pub fn save_active_options(&mut self, options: &ProcessingOptions) -> Result<(), SettingsError> {
        options.validate()?;
        self.write(ACTIVE_OPTIONS_KEY, options)
    }

    /// All presets, in display order.
    #[must_use]
    pub fn list_presets(&self) -> Vec<Preset> {
        preset::builtin_presets()
    }

    /// Name of the active preset.
    ///
    /// On first run, persists and returns `"Standard"`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the backend fails or the stored
    /// record is corrupt.
    pub fn get_active_preset_name(&mut self) -> Result<String, SettingsError> {
        self.read_or_seed(ACTIVE_PRESET_KEY, || preset::STANDARD.to_owned())
    }

    /// Record `name` as the active preset.
    ///
    /// The name is stored as given; use [`apply_preset`](Self::apply_preset)
    /// to switch presets and options together.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub fn set_active_preset_name(&mut self, name: &str) -> Result<(), SettingsError> {
        self.write(ACTIVE_PRESET_KEY, name)
    }

    /// The user's custom options.
    ///
    /// On first run, persists and returns the built-in Custom defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the backend fails or the stored
    /// record is corrupt.
    pub fn get_custom_preset(&mut self) -> Result<ProcessingOptions, SettingsError> {
        self.read_or_seed(CUSTOM_PRESET_KEY, || {
            preset::find_builtin(preset::CUSTOM)
                .map_or_else(preset::default_options, |p| p.options)
        })
    }

    /// Replace the custom preset's options.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidOptions`] without writing if
    /// `options` fail validation, or a backend error.
    pub fn save_custom_preset(&mut self, options: &ProcessingOptions) -> Result<(), SettingsError> {
        options.validate()?;
        self.write(CUSTOM_PRESET_KEY, options)
    }

    /// Save hand-edited options: writes the custom preset and the active
    /// options to the same values and marks "Custom" active.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidOptions`] without writing if
    /// `options` fail validation, or a backend error.
    pub fn save_custom_options(&mut self, options: &ProcessingOptions) -> Result<(), SettingsError> {
        self.save_custom_preset(options)?;
        self.save_active_options(options)?;
        self.set_active_preset_name(preset::CUSTOM)
    }

    /// Resolve `name` to its options, make them active, and record
    /// `name` as the active preset.
    ///
    /// "Custom" resolves to the stored custom preset.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownPreset`] without writing if no
    /// preset has that name, or a backend error.
    pub fn apply_preset(&mut self, name: &str) -> Result<ProcessingOptions, SettingsError> {
        let options = if name == preset::CUSTOM {
            self.get_custom_preset()?
        } else {
            preset::find_builtin(name)
                .ok_or_else(|| SettingsError::UnknownPreset(name.to_owned()))?
                .options
        };

        self.save_active_options(&options)?;
        self.set_active_preset_name(name)?;
        log::info!("applied preset {name:?}");
        Ok(options)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SettingsError> {
        self.backend
            .get(key)?
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|source| {
                    unsupported_format(&raw).map_or_else(
                        || SettingsError::Corrupt {
                            key: key.to_owned(),
                            source,
                        },
                        SettingsError::InvalidOptions,
                    )
                })
            })
            .transpose()
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), SettingsError> {
        let raw = serde_json::to_string(value).map_err(|source| SettingsError::Corrupt {
            key: key.to_owned(),
            source,
        })?;
        self.backend.set(key, &raw)
    }

    fn read_or_seed<T, F>(&mut self, key: &str, seed: F) -> Result<T, SettingsError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        if let Some(value) = self.read(key)? {
            return Ok(value);
        }
        let value = seed();
        log::debug!("seeding default value for {key:?}");
        self.write(key, &value)?;
        Ok(value)
    }
}

/// The [`ProcessError::UnsupportedFormat`] behind a failed parse, if
/// the record is well-formed JSON naming an unknown `format`.
fn unsupported_format(raw: &str) -> Option<ProcessError> {
    let record: serde_json::Value = serde_json::from_str(raw).ok()?;
    record.get("format")?.as_str()?.parse::<OutputFormat>().err()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store() -> SettingsStore<MemoryStore> {
        SettingsStore::new(MemoryStore::new())
    }

    fn custom_options() -> ProcessingOptions {
        ProcessingOptions::new(1_500_000, 640, 480, 0.7, OutputFormat::Jpeg)
    }

    /// Backend that fails every call.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, SettingsError> {
            Err(SettingsError::Backend("offline".into()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), SettingsError> {
            Err(SettingsError::Backend("offline".into()))
        }
    }

    #[test]
    fn first_read_seeds_standard_defaults() {
        let mut s = store();
        let opts = s.get_active_options().unwrap();
        assert_eq!(
            opts,
            ProcessingOptions::new(5_000_000, 2000, 2000, 0.9, OutputFormat::Png)
        );
        // Persisted, not just returned.
        assert!(s.backend().get(ACTIVE_OPTIONS_KEY).unwrap().is_some());
    }

    #[test]
    fn first_read_of_active_name_seeds_standard() {
        let mut s = store();
        assert_eq!(s.get_active_preset_name().unwrap(), preset::STANDARD);
        assert_eq!(
            s.backend().get(ACTIVE_PRESET_KEY).unwrap().as_deref(),
            Some("\"Standard\"")
        );
    }

    #[test]
    fn first_read_of_custom_seeds_standard_values() {
        let mut s = store();
        assert_eq!(s.get_custom_preset().unwrap(), preset::default_options());
        assert!(s.backend().get(CUSTOM_PRESET_KEY).unwrap().is_some());
    }

    #[test]
    fn records_are_independent() {
        let mut s = store();
        s.save_active_options(&custom_options()).unwrap();
        assert_eq!(s.get_active_options().unwrap(), custom_options());
        assert_eq!(s.get_custom_preset().unwrap(), preset::default_options());
        assert_eq!(s.get_active_preset_name().unwrap(), preset::STANDARD);
    }

    #[test]
    fn apply_builtin_preset() {
        let mut s = store();
        let opts = s.apply_preset(preset::WEB_OPTIMIZED).unwrap();
        let expected = ProcessingOptions::new(2_000_000, 1200, 1200, 0.85, OutputFormat::Jpeg);
        assert_eq!(opts, expected);
        assert_eq!(s.get_active_options().unwrap(), expected);
        assert_eq!(s.get_active_preset_name().unwrap(), preset::WEB_OPTIMIZED);
    }

    #[test]
    fn apply_custom_uses_stored_custom_values() {
        let mut s = store();
        s.save_custom_preset(&custom_options()).unwrap();
        s.apply_preset(preset::STANDARD).unwrap();

        let opts = s.apply_preset(preset::CUSTOM).unwrap();
        assert_eq!(opts, custom_options());
        assert_eq!(s.get_active_options().unwrap(), custom_options());
        assert_eq!(s.get_active_preset_name().unwrap(), preset::CUSTOM);
    }

    #[test]
    fn apply_unknown_preset_changes_nothing() {
        let mut s = store();
        s.apply_preset(preset::SOCIAL_MEDIA).unwrap();
        let before = s.backend().clone();

        let err = s.apply_preset("Ultra").unwrap_err();
        assert!(matches!(err, SettingsError::UnknownPreset(ref n) if n == "Ultra"));
        assert_eq!(s.backend(), &before);
    }

    #[test]
    fn saving_custom_options_updates_both_records() {
        let mut s = store();
        s.apply_preset(preset::CUSTOM).unwrap();
        s.save_custom_options(&custom_options()).unwrap();

        assert_eq!(s.get_custom_preset().unwrap(), custom_options());
        assert_eq!(s.get_active_options().unwrap(), custom_options());
        assert_eq!(s.get_active_preset_name().unwrap(), preset::CUSTOM);
    }

    #[test]
    fn invalid_options_are_not_saved() {
        let mut s = store();
        let bad = ProcessingOptions {
            max_width: 0,
            ..custom_options()
        };
        assert!(matches!(
            s.save_custom_options(&bad),
            Err(SettingsError::InvalidOptions(ProcessError::InvalidOptions(_)))
        ));
        assert!(s.backend().is_empty());
    }

    #[test]
    fn list_presets_returns_builtin_table() {
        let s = store();
        let names: Vec<_> = s.list_presets().into_iter().map(|p| p.name).collect();
        assert_eq!(names.len(), 5);
        assert_eq!(names[0], preset::STANDARD);
        assert_eq!(names[4], preset::CUSTOM);
    }

    #[test]
    fn corrupt_record_is_reported_with_key() {
        let mut backend = MemoryStore::new();
        backend.set(ACTIVE_OPTIONS_KEY, "{not json").unwrap();
        let mut s = SettingsStore::new(backend);
        let result = s.get_active_options();
        assert!(
            matches!(result, Err(SettingsError::Corrupt { ref key, .. }) if key == ACTIVE_OPTIONS_KEY),
            "expected Corrupt, got {result:?}"
        );
    }

    #[test]
    fn unknown_stored_format_is_reported_as_unsupported() {
        let mut backend = MemoryStore::new();
        backend
            .set(
                ACTIVE_OPTIONS_KEY,
                r#"{"maxFileSize":1000,"maxWidth":10,"maxHeight":20,"format":"webp"}"#,
            )
            .unwrap();
        let mut s = SettingsStore::new(backend);
        let result = s.get_active_options();
        assert!(
            matches!(
                result,
                Err(SettingsError::InvalidOptions(ProcessError::UnsupportedFormat(ref f))) if f == "webp"
            ),
            "expected UnsupportedFormat, got {result:?}"
        );
    }

    #[test]
    fn unknown_format_inside_custom_preset_is_reported_as_unsupported() {
        let mut backend = MemoryStore::new();
        backend
            .set(
                CUSTOM_PRESET_KEY,
                r#"{"maxFileSize":1000,"maxWidth":10,"maxHeight":20,"format":"tiff"}"#,
            )
            .unwrap();
        let mut s = SettingsStore::new(backend);
        assert!(matches!(
            s.get_custom_preset(),
            Err(SettingsError::InvalidOptions(ProcessError::UnsupportedFormat(_)))
        ));
    }

    #[test]
    fn uppercase_stored_format_is_accepted() {
        let mut backend = MemoryStore::new();
        backend
            .set(
                ACTIVE_OPTIONS_KEY,
                r#"{"maxFileSize":1000,"maxWidth":10,"maxHeight":20,"format":"JPEG"}"#,
            )
            .unwrap();
        let mut s = SettingsStore::new(backend);
        assert_eq!(s.get_active_options().unwrap().format, Some(OutputFormat::Jpeg));
    }

    #[test]
    fn reads_extension_style_records() {
        let mut backend = MemoryStore::new();
        backend
            .set(
                ACTIVE_OPTIONS_KEY,
                r#"{"maxFileSize":2500000,"maxWidth":1600,"maxHeight":900,"quality":0.8,"format":"jpeg"}"#,
            )
            .unwrap();
        let mut s = SettingsStore::new(backend);
        let opts = s.get_active_options().unwrap();
        assert_eq!(opts.max_file_size, 2_500_000);
        assert_eq!(opts.format, Some(OutputFormat::Jpeg));
    }

    #[test]
    fn backend_errors_propagate() {
        let mut s = SettingsStore::new(BrokenStore);
        assert!(matches!(
            s.get_active_options(),
            Err(SettingsError::Backend(_))
        ));
        assert!(matches!(
            s.apply_preset(preset::STANDARD),
            Err(SettingsError::Backend(_))
        ));
    }
}
