//! Image picker with drag-and-drop.

use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::LdUpload;
use fitpix_core::mime_type_for;

/// `accept` filter for the file input; mirrors [`mime_type_for`].
const ACCEPT: &str = "image/png,image/jpeg,image/bmp,image/webp,image/gif";

/// Why a picked file was not forwarded.
fn rejection(name: &str) -> Option<String> {
    if mime_type_for(name).is_some() {
        None
    } else {
        Some(format!("Unsupported file type: {name}"))
    }
}

/// Props for the [`FileUpload`] component.
#[derive(Props, Clone, PartialEq)]
pub struct FileUploadProps {
    /// Called with the filename once an accepted file starts loading.
    on_start: EventHandler<String>,
    /// Called with the raw bytes and filename after the read completes.
    on_upload: EventHandler<(Vec<u8>, String)>,
    /// Called with the filename if the read fails after `on_start`.
    on_error: EventHandler<String>,
}

/// Drop zone plus "Upload Image" button.
///
/// Only the first file of a selection or drop is used. Each new pick
/// replaces the previous image.
#[component]
pub fn FileUpload(props: FileUploadProps) -> Element {
    let mut dragging = use_signal(|| false);
    let mut error = use_signal(|| Option::<String>::None);

    let take_first = move |files: Vec<FileData>| async move {
        let Some(file) = files.into_iter().next() else {
            return;
        };
        let name = file.name();
        if let Some(reason) = rejection(&name) {
            log::warn!("{reason}");
            error.set(Some(reason));
            return;
        }
        error.set(None);
        props.on_start.call(name.clone());

        match file.read_bytes().await {
            Ok(bytes) => props.on_upload.call((bytes.to_vec(), name)),
            Err(e) => {
                log::error!("reading {name}: {e}");
                error.set(Some(format!("Failed to read file: {e}")));
                props.on_error.call(name);
            }
        }
    };

    let zone_class = if dragging() {
        "upload-zone dragging"
    } else {
        "upload-zone"
    };

    rsx! {
        div {
            class: "{zone_class}",
            ondragover: move |evt| {
                evt.prevent_default();
                dragging.set(true);
            },
            ondragleave: move |_| dragging.set(false),
            ondrop: move |evt: DragEvent| async move {
                evt.prevent_default();
                dragging.set(false);
                take_first(evt.files()).await;
            },

            p { class: "secondary-text", "Drop an image here or" }

            label { class: "button",
                input {
                    r#type: "file",
                    accept: ACCEPT,
                    class: "hidden",
                    onchange: move |evt: FormEvent| async move {
                        take_first(evt.files()).await;
                    },
                }
                Icon { width: 16, height: 16, icon: LdUpload }
                "Upload Image"
            }

            if let Some(ref err) = error() {
                p { class: "error-text", "{err}" }
            }

            p { class: "muted-text", "PNG, JPEG, BMP, WebP, GIF" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_decodable_types_in_any_case() {
        assert_eq!(rejection("cat.PNG"), None);
        assert_eq!(rejection("holiday.photo.jpeg"), None);
        assert_eq!(rejection("anim.gif"), None);
    }

    #[test]
    fn names_the_rejected_file() {
        assert_eq!(
            rejection("vector.svg").as_deref(),
            Some("Unsupported file type: vector.svg")
        );
        assert!(rejection("README").is_some());
    }

    #[test]
    fn accept_filter_lists_every_decodable_type() {
        for name in ["a.png", "a.jpg", "a.bmp", "a.webp", "a.gif"] {
            let mime = mime_type_for(name).unwrap_or_default();
            assert!(ACCEPT.split(',').any(|m| m == mime), "{mime} missing");
        }
    }
}
