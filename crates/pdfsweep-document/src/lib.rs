// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfsweep-document — Page inspection and object removal for pdfsweep.
//
// Lists the images, vector drawings, and text blocks on a page (the object
// catalog), removes a chosen object across one or all pages, renders a
// wireframe preview of a page, and provides the lopdf-backed document the
// rest of the crate operates on.

pub mod access;
pub mod catalog;
pub mod pdf;
pub mod preview;
pub mod removal;

// Re-export the primary entry points so callers can use `pdfsweep_document::PdfDocument` etc.
pub use access::{DocumentAccess, DocumentEditor};
pub use catalog::{build_catalog, catalog_labels};
pub use pdf::PdfDocument;
pub use preview::{Preview, render_preview};
pub use removal::{RemovalConfig, remove_object};
