//! Progress line shown under the upload zone.

use std::fmt;

/// Where the current upload is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// Nothing uploaded yet.
    #[default]
    Idle,
    /// File bytes are being read.
    Loading,
    /// Decode, resize, and quality search are running.
    Optimizing,
    /// A result is ready to download.
    Done,
    /// Processing failed; details are in the console log.
    Failed,
}

impl Status {
    /// Status after the file read failed.
    ///
    /// The upload zone reports the read error itself, so a pending
    /// "Loading image..." is cleared; any other status is kept.
    pub const fn after_read_error(self) -> Self {
        match self {
            Self::Loading => Self::Idle,
            other => other,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "",
            Self::Loading => "Loading image...",
            Self::Optimizing => "Optimizing image...",
            Self::Done => "Image optimized successfully!",
            Self::Failed => "Error optimizing image. Please try again.",
        })
    }
}
