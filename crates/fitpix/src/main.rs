mod session;
mod status;

use std::rc::Rc;

use dioxus::prelude::*;
use fitpix_core::decode::probe_dimensions;
use fitpix_core::{
    Dimensions, ProcessConfig, ProcessError, ProcessResult, ProcessingOptions, mime_type_for,
    output_filename,
};
use fitpix_io::download::DownloadError;
use fitpix_io::{BrowserStore, FileUpload, Optimized, Preview, ResultPanel, SettingsPanel};
use web_time::Instant;

use crate::session::{Generation, Session};
use crate::status::Status;

const STYLE: &str = include_str!("../assets/fitpix.css");

fn main() {
    fitpix_io::logger::init(log::LevelFilter::Info);
    dioxus::launch(app);
}

/// The file the user picked.
#[derive(Debug)]
struct Upload {
    bytes: Vec<u8>,
    name: String,
    dimensions: Dimensions,
}

impl Upload {
    /// Accept `bytes` once its header names a non-empty image.
    fn new(bytes: Vec<u8>, name: String) -> Result<Self, ProcessError> {
        let dimensions = probe_dimensions(&bytes)?;
        Ok(Self {
            bytes,
            name,
            dimensions,
        })
    }

    fn preview(&self) -> Result<Preview, DownloadError> {
        Preview::new(
            &self.bytes,
            mime_type_for(&self.name).unwrap_or_default(),
            self.dimensions,
        )
    }
}

/// Build the optimized preview for a finished run.
fn present(upload: &Upload, result: ProcessResult, elapsed_ms: u64) -> Result<Optimized, DownloadError> {
    Ok(Optimized {
        preview: Preview::new(&result.bytes, result.format.mime_type(), result.output)?,
        filename: output_filename(&upload.name, result.format),
        quality: result.quality,
        attempts: result.attempts,
        within_budget: result.within_budget,
        elapsed_ms,
    })
}

/// Root application component.
///
/// Holds the settings session, the current upload, and the latest
/// result, and re-runs processing whenever the upload or the active
/// options change.
#[allow(clippy::too_many_lines)]
fn app() -> Element {
    // --- Application state ---
    let mut session = use_signal(|| Session::load(BrowserStore::open_or_memory()));
    let mut upload = use_signal(|| Option::<Rc<Upload>>::None);
    let mut original = use_signal(|| Option::<Rc<Preview>>::None);
    let mut optimized = use_signal(|| Option::<Rc<Optimized>>::None);
    let mut status = use_signal(Status::default);
    let mut generation = use_signal(Generation::default);

    // --- File upload handlers ---
    let on_start = move |name: String| {
        log::debug!("loading {name}");
        // Results still in flight belong to the previous image.
        generation.write().begin();
        status.set(Status::Loading);
        original.set(None);
        optimized.set(None);
    };

    let on_upload = move |(bytes, name): (Vec<u8>, String)| {
        log::info!("uploaded {name} ({} bytes)", bytes.len());
        let accepted = Upload::new(bytes, name.clone())
            .map_err(|e| e.to_string())
            .and_then(|u| {
                let preview = u.preview().map_err(|e| e.to_string())?;
                Ok((u, preview))
            });
        match accepted {
            Ok((u, preview)) => {
                original.set(Some(Rc::new(preview)));
                upload.set(Some(Rc::new(u)));
            }
            Err(e) => {
                log::error!("error loading {name}: {e}");
                upload.set(None);
                status.set(Status::Failed);
            }
        }
    };

    let on_error = move |name: String| {
        log::debug!("read of {name} failed");
        let next = status.peek().after_read_error();
        status.set(next);
    };

    // --- Processing effect ---
    // Re-runs whenever the upload or the active options change.
    use_effect(move || {
        let Some(current) = upload() else {
            return;
        };
        let options = session.read().options();

        // Any in-flight task from an earlier trigger is now stale.
        let my_generation = generation.write().begin();

        status.set(Status::Optimizing);
        optimized.set(None);

        spawn(async move {
            // Let the browser paint the status line before the
            // synchronous work blocks the thread.
            gloo_timers::future::TimeoutFuture::new(0).await;

            let started = Instant::now();
            let outcome = fitpix_core::process(&current.bytes, &options, &ProcessConfig::default());
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            if !generation.peek().is_current(my_generation) {
                log::debug!("discarding stale result for {}", current.name);
                return;
            }

            let presented = match outcome {
                Ok(result) => present(&current, result, elapsed_ms).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match presented {
                Ok(opt) => {
                    log::info!(
                        "optimized {} to {} in {elapsed_ms} ms",
                        current.name,
                        opt.filename
                    );
                    optimized.set(Some(Rc::new(opt)));
                    status.set(Status::Done);
                }
                Err(e) => {
                    // The original preview stays up next to the error.
                    log::error!("error optimizing {}: {e}", current.name);
                    status.set(Status::Failed);
                }
            }
        });
    });

    // --- Settings handlers ---
    let on_preset_select = move |name: String| {
        if let Err(e) = session.write().select_preset(&name) {
            log::error!("selecting preset {name:?}: {e}");
        }
    };

    let on_save_custom = move |options: ProcessingOptions| {
        if let Err(e) = session.write().save_custom(options) {
            log::error!("saving custom settings: {e}");
        }
    };

    let (presets, active_name, options, persistent) = {
        let s = session.read();
        (
            s.presets(),
            s.active_name().to_owned(),
            s.options(),
            s.backend().is_persistent(),
        )
    };
    let status_text = status().to_string();

    // --- Layout ---
    rsx! {
        style { dangerous_inner_html: STYLE }

        div { class: "app",
            header {
                h1 { "fitpix" }
                p { class: "muted-text",
                    "Resize and recompress an image to fit a file size limit"
                }
            }

            main {
                SettingsPanel {
                    presets,
                    active_name,
                    options,
                    on_preset_select,
                    on_save_custom,
                }

                if !persistent {
                    p { class: "muted-text",
                        "Browser storage is unavailable; settings last until the page closes."
                    }
                }

                FileUpload { on_start, on_upload, on_error }

                if !status_text.is_empty() {
                    p { class: "status", "{status_text}" }
                }

                ResultPanel {
                    original: original(),
                    optimized: optimized(),
                }
            }
        }
    }
}
