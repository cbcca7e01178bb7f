// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF backend — lopdf document access, content interpretation, and redaction.

pub mod document;
mod fonts;
mod interpreter;
mod objects;
mod patch;
mod redact;

pub use document::PdfDocument;
