//! JSON-file backend for [`SettingsStore`](fitpix_core::SettingsStore).
//!
//! The file is one JSON object whose keys are the settings record keys
//! and whose values are the records themselves, e.g.
//!
//! ```json
//! {
//!   "image_optimizer_active_preset": "Web Optimized",
//!   "image_optimizer_settings": { "maxFileSize": 2000000, ... }
//! }
//! ```
//!
//! Every write rewrites the whole file.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use fitpix_core::{KeyValueStore, SettingsError};
use serde_json::Value;

/// Errors that can occur when opening a settings file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The file exists but could not be read.
    #[error("reading {path}: {source}")]
    Read {
        /// Settings file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file is not a JSON object.
    #[error("parsing {path}: {source}")]
    Parse {
        /// Settings file path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// [`KeyValueStore`] persisted as a single JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl JsonFileStore {
    /// Load `path`, or start empty if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the file exists but cannot be
    /// read, or [`StoreError::Parse`] if it is not a JSON object.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("{} not found, starting empty", path.display());
                BTreeMap::new()
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        Ok(Self { path, entries })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), SettingsError> {
        let text = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| SettingsError::Backend(format!("encoding settings: {e}")))?;
        std::fs::write(&self.path, text + "\n")
            .map_err(|e| SettingsError::Backend(format!("writing {}: {e}", self.path.display())))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self.entries.get(key).map(Value::to_string))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let value = serde_json::from_str(value)
            .map_err(|e| SettingsError::Backend(format!("value for {key:?} is not JSON: {e}")))?;
        self.entries.insert(key.to_owned(), value);
        self.persist()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fitpix_core::preset::{CUSTOM, WEB_OPTIMIZED};
    use fitpix_core::settings::{ACTIVE_OPTIONS_KEY, ACTIVE_PRESET_KEY};
    use fitpix_core::{OutputFormat, ProcessingOptions, SettingsStore};

    use super::*;

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.get(ACTIVE_PRESET_KEY).unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set(ACTIVE_PRESET_KEY, "\"Standard\"").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(ACTIVE_PRESET_KEY).unwrap().as_deref(),
            Some("\"Standard\"")
        );
    }

    #[test]
    fn records_are_stored_as_readable_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = SettingsStore::new(JsonFileStore::open(&path).unwrap());
        settings.apply_preset(WEB_OPTIMIZED).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let doc: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc[ACTIVE_PRESET_KEY], Value::from(WEB_OPTIMIZED));
        assert_eq!(doc[ACTIVE_OPTIONS_KEY]["maxWidth"], Value::from(1200));
        assert_eq!(doc[ACTIVE_OPTIONS_KEY]["format"], Value::from("jpeg"));
    }

    #[test]
    fn custom_options_round_trip_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let edited = ProcessingOptions::new(750_000, 640, 480, 0.65, OutputFormat::Jpeg);

        let mut settings = SettingsStore::new(JsonFileStore::open(&path).unwrap());
        settings.save_custom_options(&edited).unwrap();

        let mut reopened = SettingsStore::new(JsonFileStore::open(&path).unwrap());
        assert_eq!(reopened.get_active_preset_name().unwrap(), CUSTOM);
        let active = reopened.get_active_options().unwrap();
        assert_eq!(active.max_file_size, 750_000);
        assert_eq!(active.max_dimensions(), edited.max_dimensions());
        assert_eq!(active.format, Some(OutputFormat::Jpeg));
    }

    #[test]
    fn non_json_value_is_refused_and_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        assert!(matches!(
            store.set(ACTIVE_PRESET_KEY, "Standard"),
            Err(SettingsError::Backend(_))
        ));
        assert_eq!(store.get(ACTIVE_PRESET_KEY).unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Parse { .. })
        ));
    }
}
