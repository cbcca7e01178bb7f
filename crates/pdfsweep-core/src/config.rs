// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

use crate::types::{RemovalScope, SaveOptions, TextMatchMethod};

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Maximum top-left drift, per axis, for a location-and-content text match.
    pub location_tolerance: f32,
    /// Scope preselected when the user removes an object.
    pub default_scope: RemovalScope,
    /// Text match method preselected in the removal dialog.
    pub default_text_method: TextMatchMethod,
    /// Characters of block text shown in the object listing.
    pub snippet_len: usize,
    /// RGB fill painted over redacted areas, or nothing when `None`.
    pub redaction_fill: Option<[f32; 3]>,
    /// Compaction applied on "Save As".
    pub save: SaveOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            location_tolerance: 2.0,
            default_scope: RemovalScope::AllPages,
            default_text_method: TextMatchMethod::ByLocationAndContent,
            snippet_len: 40,
            redaction_fill: None,
            save: SaveOptions::default(),
        }
    }
}
