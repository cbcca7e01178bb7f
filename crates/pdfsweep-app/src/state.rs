// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Global application state — reactive signals for the Dioxus UI.

use pdfsweep_core::AppConfig;
use pdfsweep_core::types::ObjectKind;

use crate::services::app_services::AppServices;

/// Largest preview drawn, in pixels.
pub const PREVIEW_MAX_WIDTH: u32 = 800;
pub const PREVIEW_MAX_HEIGHT: u32 = 1000;

/// Shared state accessible to all pages via `use_context`.
///
/// The document itself lives in the session; this is what the pages show.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Application settings.
    pub config: AppConfig,
    /// Status bar text.
    pub status_message: Option<String>,
    /// File name of the open document.
    pub document_name: Option<String>,
    pub page_count: usize,
    /// 0-based.
    pub current_page: usize,
    /// Object list of the current page, in catalog order.
    pub labels: Vec<String>,
    /// Index into `labels` of the highlighted entry.
    pub selected: Option<usize>,
    pub selected_kind: Option<ObjectKind>,
    /// `data:image/png;base64,...` of the current preview.
    pub preview_uri: Option<String>,
    pub zoom: f32,
    /// Contents of the "go to page" box.
    pub page_input: String,
}

impl AppState {
    /// Create initial state from the backend services.
    pub fn new(svc: &AppServices) -> Self {
        Self {
            config: svc.config(),
            zoom: 1.0,
            ..Self::default()
        }
    }

    pub fn has_document(&self) -> bool {
        self.page_count > 0
    }

    /// The Remove button only acts on images and text.
    pub fn can_remove(&self) -> bool {
        matches!(
            self.selected_kind,
            Some(ObjectKind::Image) | Some(ObjectKind::Text)
        )
    }
}
