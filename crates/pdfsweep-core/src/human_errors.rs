// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the status bar and error dialogs.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives whether the UI shows an error or an informational dialog.

use crate::error::SweepError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Not really a failure: the action just isn't available.
    Informational,
    /// Retrying (or retrying elsewhere) may well succeed.
    Transient,
    /// User must do something first (open a file, pick another page).
    ActionRequired,
    /// Cannot be fixed by retrying: broken file, unsupported content.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as the dialog title).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level (drives dialog kind).
    pub severity: Severity,
}

/// Convert a `SweepError` into a `HumanError`.
pub fn humanize_error(err: &SweepError) -> HumanError {
    match err {
        SweepError::DocumentLoad(detail) => HumanError {
            message: "This file couldn't be opened as a PDF.".into(),
            suggestion: format!("The file may be damaged or not a PDF. ({detail})"),
            severity: Severity::Permanent,
        },

        SweepError::EmptyDocument => HumanError {
            message: "The selected PDF has no pages.".into(),
            suggestion: "Choose a different file.".into(),
            severity: Severity::ActionRequired,
        },

        SweepError::NoDocument => HumanError {
            message: "No PDF is open.".into(),
            suggestion: "Use \"Upload PDF\" to open a document first.".into(),
            severity: Severity::ActionRequired,
        },

        SweepError::PageOutOfRange { count, .. } => HumanError {
            message: "That page doesn't exist.".into(),
            suggestion: format!("Enter a page number between 1 and {count}."),
            severity: Severity::ActionRequired,
        },

        SweepError::Pdf(detail) => HumanError {
            message: "Part of this page couldn't be read.".into(),
            suggestion: format!("The page content may be malformed. ({detail})"),
            severity: Severity::Permanent,
        },

        SweepError::Mutation(detail) => HumanError {
            message: "An error occurred during removal.".into(),
            suggestion: format!(
                "Pages processed before the error keep their changes; close without saving to discard them. ({detail})"
            ),
            severity: Severity::Transient,
        },

        SweepError::StaleSelection { .. } => HumanError {
            message: "That object is no longer on this page.".into(),
            suggestion: "The list has been refreshed; select the object again.".into(),
            severity: Severity::ActionRequired,
        },

        SweepError::UnsupportedRemoval(kind) => HumanError {
            message: "Not supported.".into(),
            suggestion: format!("Removal of '{kind}' objects is not yet supported."),
            severity: Severity::Informational,
        },

        SweepError::Save(detail) => HumanError {
            message: "Could not save the file.".into(),
            suggestion: format!("Try a different folder or file name. ({detail})"),
            severity: Severity::Transient,
        },

        SweepError::ImageError(_) => HumanError {
            message: "The page preview couldn't be drawn.".into(),
            suggestion: "The object list is still accurate; try resizing the window.".into(),
            severity: Severity::Transient,
        },

        SweepError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or pick a different location.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    severity: Severity::Transient,
                }
            }
        }

        SweepError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read or written.".into(),
            suggestion: "Defaults are in use. Saving settings again will replace the file.".into(),
            severity: Severity::Transient,
        },
    }
}
