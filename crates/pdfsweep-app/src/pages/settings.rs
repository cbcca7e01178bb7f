// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Settings page — persistent app configuration.

use dioxus::prelude::*;

use pdfsweep_core::types::{RemovalScope, TextMatchMethod};

use crate::services::app_services::AppServices;
use crate::state::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const ROW_STYLE: &str = "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;";
const FIELD_STYLE: &str = "padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;";

#[component]
pub fn Settings() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let mut save_msg = use_signal(|| Option::<String>::None);

    let fill_enabled = state.read().config.redaction_fill.is_some();

    rsx! {
        div {
            h1 { "Settings" }

            section { style: "margin: 16px 0;",
                h3 { "Removal" }
                div { style: ROW_STYLE,
                    span { "Location tolerance (pt)" }
                    input {
                        r#type: "number",
                        step: "0.5",
                        style: "{FIELD_STYLE} width: 80px; text-align: right;",
                        value: "{state.read().config.location_tolerance}",
                        onchange: move |evt| {
                            if let Ok(tolerance) = evt.value().parse::<f32>()
                                && tolerance.is_finite()
                                && tolerance >= 0.0
                            {
                                state.write().config.location_tolerance = tolerance;
                            }
                        },
                    }
                }
                div { style: ROW_STYLE,
                    span { "Remove from" }
                    select {
                        style: FIELD_STYLE,
                        value: scope_label(state.read().config.default_scope),
                        onchange: move |evt| {
                            if let Some(scope) = scope_from_label(&evt.value()) {
                                state.write().config.default_scope = scope;
                            }
                        },
                        option { value: "all", "All pages" }
                        option { value: "current", "Current page only" }
                    }
                }
                div { style: ROW_STYLE,
                    span { "Default text match" }
                    select {
                        style: FIELD_STYLE,
                        value: method_label(state.read().config.default_text_method),
                        onchange: move |evt| {
                            if let Some(method) = method_from_label(&evt.value()) {
                                state.write().config.default_text_method = method;
                            }
                        },
                        option { value: "location", "By location and content" }
                        option { value: "content", "By content only" }
                    }
                }
                SettingRow {
                    label: "Paint white over removed text",
                    checked: fill_enabled,
                    on_toggle: move |v: bool| {
                        state.write().config.redaction_fill = v.then_some([1.0, 1.0, 1.0]);
                    },
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Object List" }
                div { style: ROW_STYLE,
                    span { "Text preview length" }
                    input {
                        r#type: "number",
                        style: "{FIELD_STYLE} width: 80px; text-align: right;",
                        value: "{state.read().config.snippet_len}",
                        onchange: move |evt| {
                            if let Ok(len) = evt.value().parse::<usize>()
                                && len > 0
                            {
                                state.write().config.snippet_len = len;
                            }
                        },
                    }
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Saving" }
                SettingRow {
                    label: "Drop unused objects",
                    checked: state.read().config.save.prune_unused,
                    on_toggle: move |v: bool| { state.write().config.save.prune_unused = v; },
                }
                SettingRow {
                    label: "Renumber objects",
                    checked: state.read().config.save.renumber,
                    on_toggle: move |v: bool| { state.write().config.save.renumber = v; },
                }
                SettingRow {
                    label: "Compress streams",
                    checked: state.read().config.save.compress,
                    on_toggle: move |v: bool| { state.write().config.save.compress = v; },
                }
            }

            // Save button
            button {
                style: "width: 100%; padding: 12px; border-radius: 8px; border: none; background: #007aff; color: white; font-size: 16px; margin-top: 8px;",
                onclick: {
                    let svc = svc.clone();
                    move |_| {
                        let config = state.read().config.clone();
                        svc.session().apply_config(&config);
                        match svc.save_config(&config) {
                            Ok(()) => {
                                tracing::info!("settings saved");
                                save_msg.set(Some("Settings saved.".into()));
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "failed to save settings");
                                save_msg.set(Some(format!("Save failed: {e}")));
                            }
                        }
                    }
                },
                "Save Settings"
            }
            if let Some(ref msg) = *save_msg.read() {
                p { style: "color: #34c759; font-size: 14px; text-align: center; margin-top: 8px;",
                    "{msg}"
                }
            }

            section { style: "margin: 24px 0;",
                h3 { "About" }
                p { style: "color: #666; font-size: 14px;",
                    "pdfsweep v{VERSION}"
                    br {}
                    "Remove images and repeated text from PDF pages"
                    br {}
                    "PMPL-1.0-or-later"
                }
            }
        }
    }
}

#[component]
fn SettingRow(label: &'static str, checked: bool, on_toggle: EventHandler<bool>) -> Element {
    rsx! {
        div { style: ROW_STYLE,
            span { "{label}" }
            input {
                r#type: "checkbox",
                checked: checked,
                onchange: move |evt| {
                    on_toggle.call(evt.checked());
                },
            }
        }
    }
}

fn scope_label(scope: RemovalScope) -> &'static str {
    match scope {
        RemovalScope::AllPages => "all",
        RemovalScope::CurrentPageOnly => "current",
    }
}

fn scope_from_label(label: &str) -> Option<RemovalScope> {
    match label {
        "all" => Some(RemovalScope::AllPages),
        "current" => Some(RemovalScope::CurrentPageOnly),
        _ => None,
    }
}

fn method_label(method: TextMatchMethod) -> &'static str {
    match method {
        TextMatchMethod::ByLocationAndContent => "location",
        TextMatchMethod::ByContentOnly => "content",
    }
}

fn method_from_label(label: &str) -> Option<TextMatchMethod> {
    match label {
        "location" => Some(TextMatchMethod::ByLocationAndContent),
        "content" => Some(TextMatchMethod::ByContentOnly),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_labels_map_back() {
        for scope in [RemovalScope::AllPages, RemovalScope::CurrentPageOnly] {
            assert_eq!(scope_from_label(scope_label(scope)), Some(scope));
        }
        for method in [TextMatchMethod::ByLocationAndContent, TextMatchMethod::ByContentOnly] {
            assert_eq!(method_from_label(method_label(method)), Some(method));
        }
        assert_eq!(scope_from_label("everywhere"), None);
    }
}
