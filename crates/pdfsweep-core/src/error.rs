// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pdfsweep.

use thiserror::Error;

use crate::types::ObjectKind;

/// Top-level error type for all pdfsweep operations.
#[derive(Debug, Error)]
pub enum SweepError {
    // -- Loading --
    #[error("failed to load document: {0}")]
    DocumentLoad(String),

    #[error("the document has no pages")]
    EmptyDocument,

    #[error("no document is open")]
    NoDocument,

    #[error("page {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    // -- Inspection / removal --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("removal failed: {0}")]
    Mutation(String),

    #[error("object #{number} is not in the current page listing")]
    StaleSelection { number: usize },

    #[error("removal of {0} objects is not supported")]
    UnsupportedRemoval(ObjectKind),

    // -- Output --
    #[error("failed to save document: {0}")]
    Save(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SweepError>;
