//! Preset picker and option editor.
//!
//! Built-in presets are shown read-only. Selecting "Custom" unlocks the
//! fields; every committed edit is saved straight away.

use dioxus::prelude::*;
use dioxus_free_icons::Icon;
use dioxus_free_icons::icons::ld_icons::{LdChevronDown, LdChevronUp, LdSettings};
use fitpix_core::preset::CUSTOM;
use fitpix_core::{OutputFormat, Preset, ProcessingOptions, megabytes_to_bytes};

/// An editable field of [`ProcessingOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    MaxFileSizeMegabytes,
    MaxWidth,
    MaxHeight,
    Quality,
    Format,
}

/// Apply the raw input `value` of `field` to `options`.
///
/// Returns `None` when the text does not parse, so a half-typed number
/// never reaches storage.
fn edit_field(options: ProcessingOptions, field: Field, value: &str) -> Option<ProcessingOptions> {
    let value = value.trim();
    let mut edited = options;
    match field {
        Field::MaxFileSizeMegabytes => {
            edited.max_file_size = megabytes_to_bytes(value.parse().ok()?)?;
        }
        Field::MaxWidth => edited.max_width = value.parse().ok().filter(|w| *w > 0)?,
        Field::MaxHeight => edited.max_height = value.parse().ok().filter(|h| *h > 0)?,
        Field::Quality => {
            edited.quality = Some(value.parse().ok().filter(|q: &f32| *q > 0.0 && *q <= 1.0)?);
        }
        Field::Format => edited.format = Some(value.parse().ok()?),
    }
    Some(edited)
}

/// Quality as a whole percentage for the slider label.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quality_percent(quality: f32) -> u32 {
    (quality * 100.0).round() as u32
}

/// Props for the [`SettingsPanel`] component.
#[derive(Props, Clone, PartialEq)]
pub struct SettingsPanelProps {
    /// Every preset, in display order.
    presets: Vec<Preset>,
    /// Name of the active preset.
    active_name: String,
    /// Options currently in effect.
    options: ProcessingOptions,
    /// Called with a preset name when the user picks one.
    on_preset_select: EventHandler<String>,
    /// Called with edited options while "Custom" is active.
    on_save_custom: EventHandler<ProcessingOptions>,
}

/// Collapsible settings panel with the preset dropdown and option fields.
#[component]
pub fn SettingsPanel(props: SettingsPanelProps) -> Element {
    let mut expanded = use_signal(|| false);
    // Slider position while dragging, before the value is committed.
    let mut quality_preview = use_signal(|| Option::<f32>::None);

    let options = props.options;
    let editable = props.active_name == CUSTOM;
    let on_save = props.on_save_custom;
    let on_preset_select = props.on_preset_select;

    let preset_choices: Vec<(String, String)> = props
        .presets
        .iter()
        .map(|p| (p.name.clone(), format!("{} - {}", p.name, p.description)))
        .collect();

    // Commit one field edit, ignoring input that does not parse.
    let commit = move |field: Field, value: String| {
        if let Some(edited) = edit_field(options, field, &value) {
            on_save.call(edited);
        } else {
            log::warn!("ignoring invalid {field:?} input {value:?}");
        }
    };

    let quality = options.effective_quality();
    let quality_label = quality_percent(quality_preview().unwrap_or(quality));
    let format = options.effective_format();
    let format_choices: Vec<(String, String)> = OutputFormat::ALL
        .iter()
        .map(|f| (f.to_string(), f.extension().to_ascii_uppercase()))
        .collect();
    let heading = if editable {
        "Settings"
    } else {
        "Settings (View Only)"
    };

    rsx! {
        div { class: "panel settings-panel",
            button {
                class: "settings-toggle",
                onclick: move |_| expanded.set(!expanded()),
                Icon { width: 16, height: 16, icon: LdSettings }
                span { "Settings" }
                if expanded() {
                    Icon { width: 16, height: 16, icon: LdChevronUp }
                } else {
                    Icon { width: 16, height: 16, icon: LdChevronDown }
                }
            }

            if expanded() {
                {render_select(
                    "preset",
                    "Preset",
                    &preset_choices,
                    &props.active_name,
                    false,
                    move |name| {
                        quality_preview.set(None);
                        on_preset_select.call(name);
                    },
                )}

                h3 { class: "settings-heading", "{heading}" }

                {render_number(
                    "max-file-size",
                    "Max File Size (MB)",
                    &options.max_file_size_megabytes().to_string(),
                    "0.1",
                    "0.1",
                    !editable,
                    move |v| commit(Field::MaxFileSizeMegabytes, v),
                )}
                {render_number(
                    "max-width",
                    "Max Width (px)",
                    &options.max_width.to_string(),
                    "100",
                    "50",
                    !editable,
                    move |v| commit(Field::MaxWidth, v),
                )}
                {render_number(
                    "max-height",
                    "Max Height (px)",
                    &options.max_height.to_string(),
                    "100",
                    "50",
                    !editable,
                    move |v| commit(Field::MaxHeight, v),
                )}
                {render_quality(
                    quality,
                    quality_label,
                    !editable,
                    move |v| {
                        if let Ok(q) = v.parse() {
                            quality_preview.set(Some(q));
                        }
                    },
                    move |v| {
                        quality_preview.set(None);
                        commit(Field::Quality, v);
                    },
                )}
                {render_select(
                    "format",
                    "Format",
                    &format_choices,
                    &format.to_string(),
                    !editable,
                    move |v| commit(Field::Format, v),
                )}

                if editable {
                    button {
                        class: "button",
                        onclick: move |_| on_save.call(options),
                        "Save Custom Settings"
                    }
                }
            }
        }
    }
}

/// Render a labeled number input that reports committed values.
fn render_number(
    id: &str,
    label: &str,
    value: &str,
    min: &str,
    step: &str,
    disabled: bool,
    mut on_change: impl FnMut(String) + 'static,
) -> Element {
    let id = id.to_string();
    let label = label.to_string();
    let value = value.to_string();
    let min = min.to_string();
    let step = step.to_string();

    rsx! {
        div { class: "settings-row",
            label { r#for: "{id}", "{label}" }
            input {
                r#type: "number",
                id: "{id}",
                class: "settings-control",
                value: "{value}",
                min: "{min}",
                step: "{step}",
                disabled: disabled,
                onchange: move |e| on_change(e.value()),
            }
        }
    }
}

/// Render the quality slider with its percentage label.
fn render_quality(
    quality: f32,
    percent: u32,
    disabled: bool,
    mut on_input: impl FnMut(String) + 'static,
    mut on_change: impl FnMut(String) + 'static,
) -> Element {
    rsx! {
        div { class: "settings-row",
            label { r#for: "quality", "Quality" }
            input {
                r#type: "range",
                id: "quality",
                class: "settings-control",
                min: "0.5",
                max: "1",
                step: "0.05",
                value: "{quality}",
                disabled: disabled,
                oninput: move |e| on_input(e.value()),
                onchange: move |e| on_change(e.value()),
            }
            span { class: "quality-value", "{percent}%" }
        }
    }
}

/// Render a labeled select dropdown.
fn render_select(
    id: &str,
    label: &str,
    options: &[(String, String)],
    selected: &str,
    disabled: bool,
    mut on_change: impl FnMut(String) + 'static,
) -> Element {
    let id = id.to_string();
    let label = label.to_string();
    let options = options.to_vec();
    let selected = selected.to_string();

    rsx! {
        div { class: "settings-row",
            label { r#for: "{id}", "{label}" }
            select {
                id: "{id}",
                class: "settings-control",
                value: "{selected}",
                disabled: disabled,
                onchange: move |e| on_change(e.value()),

                for (value, display) in options.iter() {
                    option {
                        value: "{value}",
                        selected: value == &selected,
                        "{display}"
                    }
                }
            }
        }
    }
}
