//! `window.localStorage` backend for [`SettingsStore`].
//!
//! Each settings record is one `localStorage` entry holding a JSON
//! string, under the same keys [`fitpix_core::settings`] defines.
//!
//! [`SettingsStore`]: fitpix_core::SettingsStore

use fitpix_core::{KeyValueStore, MemoryStore, SettingsError};
use wasm_bindgen::JsValue;

/// Errors that can occur when opening browser storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No `window` object (not running in a browser page).
    #[error("no global window")]
    NoWindow,

    /// Storage exists in principle but is disabled (e.g. privacy mode).
    #[error("localStorage is unavailable")]
    Unavailable,

    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for StorageError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// [`KeyValueStore`] over the page's `localStorage`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    inner: web_sys::Storage,
}

impl LocalStorage {
    /// Open the current window's `localStorage`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoWindow`] outside a browser page,
    /// [`StorageError::Unavailable`] if storage is disabled, or
    /// [`StorageError::JsError`] if the browser refuses access.
    pub fn open() -> Result<Self, StorageError> {
        let window = web_sys::window().ok_or(StorageError::NoWindow)?;
        let inner = window.local_storage()?.ok_or(StorageError::Unavailable)?;
        Ok(Self { inner })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        self.inner
            .get_item(key)
            .map_err(|e| SettingsError::Backend(format!("localStorage.getItem({key}): {e:?}")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.inner
            .set_item(key, value)
            .map_err(|e| SettingsError::Backend(format!("localStorage.setItem({key}): {e:?}")))
    }
}

/// `localStorage` when the page has it, otherwise an in-memory map that
/// lasts for the session.
#[derive(Debug, Clone)]
pub enum BrowserStore {
    /// Persistent browser storage.
    Local(LocalStorage),
    /// Session-only fallback.
    Memory(MemoryStore),
}

impl BrowserStore {
    /// Open `localStorage`, falling back to memory with a warning.
    #[must_use]
    pub fn open_or_memory() -> Self {
        match LocalStorage::open() {
            Ok(local) => Self::Local(local),
            Err(e) => {
                log::warn!("settings will not persist: {e}");
                Self::Memory(MemoryStore::new())
            }
        }
    }

    /// Whether settings survive a reload.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        match self {
            Self::Local(local) => local.get(key),
            Self::Memory(memory) => memory.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        match self {
            Self::Local(local) => local.set(key, value),
            Self::Memory(memory) => memory.set(key, value),
        }
    }
}
