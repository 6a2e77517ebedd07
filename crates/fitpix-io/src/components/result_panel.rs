//! Original/optimized previews, info lines, and the download link.

use std::rc::Rc;

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdDownload;
use fitpix_core::{Dimensions, format_megabytes};

use crate::download::{BlobUrl, DownloadError};

/// An image held in memory with an object URL for display.
#[derive(Debug, PartialEq, Eq)]
pub struct Preview {
    /// Object URL of the encoded bytes.
    pub url: BlobUrl,
    /// Pixel dimensions.
    pub dimensions: Dimensions,
    /// Encoded size in bytes.
    pub size: u64,
}

impl Preview {
    /// Wrap `bytes` in a Blob URL of type `mime_type`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] if the browser refuses to create the URL.
    pub fn new(bytes: &[u8], mime_type: &str, dimensions: Dimensions) -> Result<Self, DownloadError> {
        Ok(Self {
            url: BlobUrl::from_bytes(bytes, mime_type)?,
            dimensions,
            size: bytes.len() as u64,
        })
    }
}

/// Summary line such as `1080×720px, 0.45MB`.
fn info_line(dimensions: Dimensions, size: u64) -> String {
    format!("{dimensions}, {}", format_megabytes(size))
}

/// Search summary such as `Quality 0.50 after 5 encode(s) in 120 ms`.
fn detail_line(quality: f32, attempts: u32, elapsed_ms: u64) -> String {
    format!("Quality {quality:.2} after {attempts} encode(s) in {elapsed_ms} ms")
}

/// The optimized output plus what the download needs.
#[derive(Debug, PartialEq)]
pub struct Optimized {
    /// Preview of the encoded output.
    pub preview: Preview,
    /// Suggested download name.
    pub filename: String,
    /// Final encoder quality.
    pub quality: f32,
    /// Number of encodes the search made.
    pub attempts: u32,
    /// Whether the output met the byte budget.
    pub within_budget: bool,
    /// Wall-clock processing time in milliseconds.
    pub elapsed_ms: u64,
}

/// Props for the [`ResultPanel`] component.
#[derive(Props, Clone, PartialEq)]
pub struct ResultPanelProps {
    /// The uploaded image, once decoded.
    original: Option<Rc<Preview>>,
    /// The optimized result, once available.
    optimized: Option<Rc<Optimized>>,
}

/// Side-by-side original and optimized previews with a download link.
#[component]
pub fn ResultPanel(props: ResultPanelProps) -> Element {
    let Some(original) = props.original else {
        return rsx! {};
    };
    let original_info = info_line(original.dimensions, original.size);
    let original_src = original.url.as_str().to_owned();

    rsx! {
        div { class: "panel result-panel",
            div { class: "image-info",
                p {
                    strong { "Original: " }
                    "{original_info}"
                }
                if let Some(ref optimized) = props.optimized {
                    p {
                        strong { "Optimized: " }
                        {info_line(optimized.preview.dimensions, optimized.preview.size)}
                    }
                    p { class: "result-detail", {detail_line(optimized.quality, optimized.attempts, optimized.elapsed_ms)} }
                    if !optimized.within_budget {
                        p { class: "result-warning",
                            "Could not reach the size limit; this is the smallest result."
                        }
                    }
                }
            }

            div { class: "previews",
                figure {
                    img { src: original_src, alt: "Original image" }
                    figcaption { "Original" }
                }
                if let Some(ref optimized) = props.optimized {
                    figure {
                        img { src: optimized.preview.url.as_str().to_owned(), alt: "Optimized image" }
                        figcaption { "Optimized" }
                    }
                }
            }

            if let Some(ref optimized) = props.optimized {
                a {
                    class: "button download-button",
                    href: optimized.preview.url.as_str().to_owned(),
                    download: optimized.filename.clone(),
                    Icon { width: 16, height: 16, icon: LdDownload }
                    "Download Optimized Image"
                }
            }
        }
    }
}
