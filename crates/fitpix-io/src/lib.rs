//! fitpix-io: Browser I/O and Dioxus component library.
//!
//! Handles file uploads, Blob URLs for previews and downloads,
//! `localStorage`-backed settings, console logging, and provides
//! reusable UI components for the fitpix web application.

pub mod components;
pub mod download;
pub mod logger;
pub mod storage;

pub use components::{FileUpload, Optimized, Preview, ResultPanel, SettingsPanel};
pub use download::BlobUrl;
pub use storage::{BrowserStore, LocalStorage};
