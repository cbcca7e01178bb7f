// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Workspace page — open a PDF, browse its pages, pick an object from the
// listing and remove it from one or all pages, then save the result.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dioxus::prelude::*;

use pdfsweep_core::error::SweepError;
use pdfsweep_core::human_errors::humanize_error;
use pdfsweep_core::types::{Confirmation, ObjectKind, RemovalOutcome, TextMatchMethod};
use pdfsweep_document::RemovalConfig;
use pdfsweep_document::removal::confirmation_prompt;

use crate::services::app_services::AppServices;
use crate::services::session::{outcome_message, parse_page_input};
use crate::state::{AppState, PREVIEW_MAX_HEIGHT, PREVIEW_MAX_WIDTH};

const BUTTON_STYLE: &str = "padding: 8px 14px; border-radius: 8px; border: 1px solid #007aff; color: #007aff; background: white; font-size: 14px;";

#[component]
pub fn Workspace() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();

    let select = use_callback({
        let svc = svc.clone();
        move |index: usize| {
            state.write().selected = Some(index);
            refresh(&svc, state);
        }
    });

    let go_to = use_callback({
        let svc = svc.clone();
        move |page: usize| {
            let result = svc.session().go_to(page);
            match result {
                Ok(()) => {
                    state.write().selected = None;
                    refresh(&svc, state);
                }
                Err(e) => report_error(state, &e),
            }
        }
    });

    let has_document = state.read().has_document();
    let page_count = state.read().page_count;
    let current_page = state.read().current_page;
    let labels = state.read().labels.clone();
    let selected = state.read().selected;

    rsx! {
        div { style: "display: flex; flex-direction: column; height: 100%; gap: 12px;",

            // Toolbar
            div { style: "display: flex; gap: 8px; flex-wrap: wrap; align-items: center;",
                button {
                    style: BUTTON_STYLE,
                    onclick: {
                        let svc = svc.clone();
                        move |_| open_document(&svc, state)
                    },
                    "Upload PDF"
                }
                ToolButton {
                    label: "Remove Selected Object",
                    disabled: !state.read().can_remove(),
                    onclick: {
                        let svc = svc.clone();
                        move |_| remove_selected(&svc, state)
                    },
                }
                ToolButton {
                    label: "Save As...",
                    disabled: !has_document,
                    onclick: {
                        let svc = svc.clone();
                        move |_| save_document(&svc, state)
                    },
                }
                if let Some(ref name) = state.read().document_name {
                    span { style: "color: #666; font-size: 14px; margin-left: 8px;", "{name}" }
                }
            }

            // Navigation
            if has_document {
                div { style: "display: flex; gap: 8px; align-items: center;",
                    ToolButton {
                        label: "<",
                        disabled: current_page == 0,
                        onclick: move |_| go_to.call(current_page.saturating_sub(1)),
                    }
                    span { "Page" }
                    input {
                        r#type: "text",
                        style: "width: 48px; padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px; text-align: right;",
                        value: "{state.read().page_input}",
                        oninput: move |evt| state.write().page_input = evt.value(),
                        onchange: move |evt| match parse_page_input(&evt.value(), page_count) {
                            Some(page) => go_to.call(page),
                            None => {
                                let mut s = state.write();
                                s.status_message = Some(format!(
                                    "Invalid page number. Enter a number between 1 and {page_count}."
                                ));
                                s.page_input = (s.current_page + 1).to_string();
                            }
                        },
                    }
                    span { "of {page_count}" }
                    ToolButton {
                        label: ">",
                        disabled: current_page + 1 >= page_count,
                        onclick: move |_| go_to.call(current_page + 1),
                    }
                    input {
                        r#type: "range",
                        style: "flex: 1;",
                        min: "1",
                        max: "{page_count}",
                        value: "{current_page + 1}",
                        onchange: move |evt| {
                            if let Some(page) = parse_page_input(&evt.value(), page_count) {
                                go_to.call(page);
                            }
                        },
                    }
                    span { style: "color: #666; font-size: 13px;",
                        "{(state.read().zoom * 100.0).round()}%"
                    }
                }
            }

            // Object listing and preview
            div { style: "display: flex; gap: 16px; flex: 1; min-height: 0;",
                div { style: "width: 320px; overflow-y: auto; border: 1px solid #e0e0e0; border-radius: 8px;",
                    if labels.is_empty() {
                        p { style: "color: #999; padding: 12px; font-size: 14px;",
                            if has_document { "No objects on this page." } else { "Open a PDF to list its objects." }
                        }
                    }
                    for (index, label) in labels.into_iter().enumerate() {
                        ObjectRow {
                            key: "{index}",
                            index: index,
                            label: label,
                            selected: selected == Some(index),
                            on_select: select,
                        }
                    }
                }
                div { style: "flex: 1; overflow: auto; background: #f4f4f4; border-radius: 8px; padding: 12px; text-align: center;",
                    if let Some(ref uri) = state.read().preview_uri {
                        img { src: "{uri}", style: "box-shadow: 0 1px 4px rgba(0,0,0,0.2); background: white;" }
                    }
                }
            }

            // Status bar
            div { style: "padding: 6px 8px; border-top: 1px solid #e0e0e0; color: #444; font-size: 13px; min-height: 18px;",
                if let Some(ref msg) = state.read().status_message {
                    "{msg}"
                } else {
                    "Ready"
                }
            }
        }
    }
}

#[component]
fn ObjectRow(index: usize, label: String, selected: bool, on_select: EventHandler<usize>) -> Element {
    let background = if selected { "#dbe9ff" } else { "white" };
    rsx! {
        div {
            style: "padding: 6px 10px; border-bottom: 1px solid #f0f0f0; font-size: 13px; font-family: monospace; cursor: pointer; background: {background};",
            onclick: move |_| on_select.call(index),
            "{label}"
        }
    }
}

#[component]
fn ToolButton(label: &'static str, disabled: bool, onclick: EventHandler<MouseEvent>) -> Element {
    let opacity = if disabled { "0.5" } else { "1" };
    rsx! {
        button {
            style: "{BUTTON_STYLE} opacity: {opacity};",
            disabled: disabled,
            onclick: move |evt| onclick.call(evt),
            "{label}"
        }
    }
}

// -- Actions -------------------------------------------------------------------

/// Re-render the current page and copy the result into the UI state.
fn refresh(svc: &AppServices, mut state: Signal<AppState>) {
    let (selected, snippet_len) = {
        let s = state.read();
        (s.selected, s.config.snippet_len)
    };

    let (result, page, count, kind) = {
        let mut session = svc.session();
        let result = session.render(selected, PREVIEW_MAX_WIDTH, PREVIEW_MAX_HEIGHT, snippet_len);
        let kind = selected.and_then(|index| session.object_kind(index));
        (result, session.current_page(), session.page_count(), kind)
    };

    {
        let mut s = state.write();
        s.page_count = count;
        s.current_page = page;
        s.page_input = (page + 1).to_string();
        if kind.is_none() {
            s.selected = None;
        }
        s.selected_kind = kind;
    }

    match result {
        Ok(rendered) => {
            let mut s = state.write();
            s.labels = rendered.labels;
            s.zoom = rendered.zoom;
            s.preview_uri = Some(format!("data:image/png;base64,{}", STANDARD.encode(&rendered.png)));
        }
        Err(e) => {
            {
                let mut s = state.write();
                s.labels.clear();
                s.preview_uri = None;
            }
            report_error(state, &e);
        }
    }
}

fn report_error(mut state: Signal<AppState>, err: &SweepError) {
    tracing::warn!(error = %err, "action failed");
    let human = humanize_error(err);
    state.write().status_message = Some(format!("{} {}", human.message, human.suggestion));
}

fn open_document(svc: &AppServices, mut state: Signal<AppState>) {
    let Some(path) = rfd::FileDialog::new()
        .add_filter("PDF", &["pdf"])
        .pick_file()
    else {
        return;
    };
    let config = state.read().config.clone();
    let opened = {
        let mut session = svc.session();
        session
            .open(&path, &config)
            .map(|pages| (pages, session.document_name().unwrap_or_default().to_string()))
    };
    match opened {
        Ok((pages, name)) => {
            {
                let mut s = state.write();
                s.document_name = Some(name.clone());
                s.selected = None;
                s.status_message = Some(format!("Opened {name} ({pages} pages)"));
            }
            refresh(svc, state);
        }
        Err(e) => report_error(state, &e),
    }
}

fn remove_selected(svc: &AppServices, mut state: Signal<AppState>) {
    let (selected, config) = {
        let s = state.read();
        (s.selected, s.config.clone())
    };
    let Some(index) = selected else {
        state.write().status_message = Some("Select an object from the list first.".into());
        return;
    };
    let Some(target) = svc.session().object(index).cloned() else {
        state.write().selected = None;
        refresh(svc, state);
        report_error(state, &SweepError::StaleSelection { number: index + 1 });
        return;
    };

    let scope = config.default_scope;
    let method = if target.kind() == ObjectKind::Text {
        match choose_text_method() {
            Some(method) => method,
            None => {
                state.write().status_message = Some("Removal cancelled.".into());
                return;
            }
        }
    } else {
        config.default_text_method
    };
    let confirmation = match confirmation_prompt(&target, scope, method) {
        Some((title, message)) => confirm(&title, &message),
        None => Confirmation::Approved,
    };

    let result = svc.session().remove(
        index,
        scope,
        method,
        confirmation,
        &RemovalConfig::from(&config),
    );
    match result {
        Ok(outcome) => {
            tracing::info!(?outcome, kind = %target.kind(), "removal finished");
            {
                let mut s = state.write();
                s.status_message = Some(outcome_message(&outcome, target.kind(), method));
                if matches!(outcome, RemovalOutcome::Removed { .. }) {
                    s.selected = None;
                }
            }
            refresh(svc, state);
        }
        Err(e) => {
            // Pages committed before the failure keep their changes.
            refresh(svc, state);
            report_error(state, &e);
        }
    }
}

fn save_document(svc: &AppServices, mut state: Signal<AppState>) {
    let (name, options) = {
        let s = state.read();
        (s.document_name.clone(), s.config.save.clone())
    };
    let suggested = name
        .as_deref()
        .and_then(|n| n.strip_suffix(".pdf"))
        .map(|stem| format!("{stem}_edited.pdf"))
        .unwrap_or_else(|| "edited.pdf".into());
    let Some(path) = rfd::FileDialog::new()
        .add_filter("PDF", &["pdf"])
        .set_file_name(suggested)
        .save_file()
    else {
        return;
    };
    let result = svc.session().save(&path, &options);
    match result {
        Ok(()) => {
            tracing::info!(path = %path.display(), "document saved");
            state.write().status_message = Some(format!("Saved to {}", path.display()));
        }
        Err(e) => report_error(state, &e),
    }
}

// -- Dialogs -------------------------------------------------------------------

const BY_LOCATION: &str = "By location";
const BY_CONTENT: &str = "By content";

/// Ask how text matches should be found. `None` when the user cancels.
fn choose_text_method() -> Option<TextMatchMethod> {
    use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

    let answer = MessageDialog::new()
        .set_level(MessageLevel::Info)
        .set_title("Remove Text")
        .set_description(
            "Remove only copies in the same place on the page, or every occurrence of this text?",
        )
        .set_buttons(MessageButtons::YesNoCancelCustom(
            BY_LOCATION.into(),
            BY_CONTENT.into(),
            "Cancel".into(),
        ))
        .show();
    match answer {
        MessageDialogResult::Custom(label) if label == BY_LOCATION => {
            Some(TextMatchMethod::ByLocationAndContent)
        }
        MessageDialogResult::Custom(label) if label == BY_CONTENT => {
            Some(TextMatchMethod::ByContentOnly)
        }
        MessageDialogResult::Yes => Some(TextMatchMethod::ByLocationAndContent),
        MessageDialogResult::No => Some(TextMatchMethod::ByContentOnly),
        _ => None,
    }
}

fn confirm(title: &str, message: &str) -> Confirmation {
    use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

    let answer = MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title(title)
        .set_description(message)
        .set_buttons(MessageButtons::YesNo)
        .show();
    Confirmation::from(matches!(answer, MessageDialogResult::Yes))
}
