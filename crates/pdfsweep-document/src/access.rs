// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability traits consumed by the catalog builder and removal engine.
//
// The engine never talks to a PDF library directly: anything that can list a
// page's images, drawings, and text, search text, detach images, and redact
// regions can drive it. `PdfDocument` is the lopdf-backed implementation.

use std::path::Path;

use pdfsweep_core::error::Result;
use pdfsweep_core::types::{ImageRedaction, PathKind, Rect, ResourceId, SaveOptions};

/// Page dimensions in page-space units (points).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// An image resource referenced by a page.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub resource: ResourceId,
    /// Box of the first placement on the page; empty when never painted.
    pub bbox: Rect,
    pub width_px: u32,
    pub height_px: u32,
}

/// A painted vector path.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingInfo {
    pub bbox: Rect,
    pub kind: PathKind,
}

/// Kind of an extracted block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Text,
    Image,
}

/// A position-tagged block of page content.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub bbox: Rect,
    /// Block text, lines separated by `\n`. Not trimmed.
    pub content: String,
    pub kind: BlockKind,
}

/// One occurrence of a search string; one rect per line it spans.
#[derive(Debug, Clone, PartialEq)]
pub struct TextHit {
    pub rects: Vec<Rect>,
}

/// Read-only page introspection.
///
/// Page indices are 0-based. Every method must be free of side effects so
/// that repeated calls on an unmodified page return identical results.
pub trait DocumentAccess {
    fn page_count(&self) -> usize;

    fn page_size(&self, page: usize) -> Result<PageSize>;

    /// Image resources on the page, in resource order.
    fn images(&self, page: usize) -> Result<Vec<ImageInfo>>;

    /// Painted vector paths, in content order.
    fn drawings(&self, page: usize) -> Result<Vec<DrawingInfo>>;

    /// Text and image blocks, in content order.
    fn text_blocks(&self, page: usize) -> Result<Vec<TextBlock>>;

    /// Every exact, non-overlapping occurrence of `needle` on the page.
    fn search_text(&self, page: usize, needle: &str) -> Result<Vec<TextHit>>;
}

/// Page mutation and persistence.
pub trait DocumentEditor: DocumentAccess {
    /// Detach every reference to `resource` from the page.
    ///
    /// Returns `false`, without touching the page, when the page does not
    /// reference the resource.
    fn detach_image(&mut self, page: usize, resource: ResourceId) -> Result<bool>;

    /// Queue `area` for redaction on the page. Nothing changes until
    /// [`DocumentEditor::apply_redactions`].
    fn add_redaction(&mut self, page: usize, area: Rect) -> Result<()>;

    /// Commit every queued redaction on the page and return how many were
    /// applied. An empty queue is a no-op returning 0.
    fn apply_redactions(&mut self, page: usize, images: ImageRedaction) -> Result<usize>;

    /// Write a compacted copy of the document to `path`.
    ///
    /// The in-memory document is left as it was, whether or not the write
    /// succeeds.
    fn save(&self, path: &Path, options: &SaveOptions) -> Result<()>;
}
