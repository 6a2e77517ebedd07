//! Blob object URLs for previews and downloads.
//!
//! [`BlobUrl`] wraps `URL.createObjectURL` for a byte buffer and revokes
//! the URL when dropped, so replacing a result releases the old Blob.
//!
//! All functions in this module require a browser environment
//! (`wasm32-unknown-unknown` target).

use wasm_bindgen::JsValue;
use web_sys::BlobPropertyBag;

/// Errors that can occur when creating a Blob URL.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for DownloadError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// An object URL pointing at an in-memory Blob. Revoked on drop.
#[derive(Debug, PartialEq, Eq)]
pub struct BlobUrl {
    url: String,
}

impl BlobUrl {
    /// Copy `bytes` into a Blob of type `mime_type` and create an object
    /// URL for it.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::JsError`] if Blob or URL creation fails.
    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Result<Self, DownloadError> {
        let uint8_array = js_sys::Uint8Array::from(bytes);
        let parts = js_sys::Array::new();
        parts.push(&uint8_array);

        let opts = BlobPropertyBag::new();
        opts.set_type(mime_type);
        let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &opts)?;

        let url = web_sys::Url::create_object_url_with_blob(&blob)?;
        Ok(Self { url })
    }

    /// The `blob:` URL, usable as `<img src>` or `<a href>`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for BlobUrl {
    fn drop(&mut self) {
        // Best-effort: the URL may already be gone with its document.
        let _ = web_sys::Url::revoke_object_url(&self.url);
    }
}
