//! Dioxus UI components for fitpix.
//!
//! Provides the file upload zone, the preset/settings panel, and the
//! result panel with previews and the download link.

mod result_panel;
mod settings_panel;
mod upload;

pub use result_panel::{Optimized, Preview, ResultPanel};
pub use settings_panel::SettingsPanel;
pub use upload::FileUpload;
