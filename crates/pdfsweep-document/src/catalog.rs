// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Object catalog — the per-page list of images, vector drawings, and text
// blocks shown to the user, plus the labels the listing displays.

use pdfsweep_core::error::Result;
use pdfsweep_core::types::{ObjectKind, PageObject};
use tracing::{debug, instrument};

use crate::access::{BlockKind, DocumentAccess};

/// Build the catalog for `page`: images, then vectors, then text blocks,
/// each group in the order the document reports them.
///
/// Only plain-text blocks with non-empty trimmed content are listed. The
/// document is not modified, so calling this twice on an unchanged page
/// yields the same catalog.
#[instrument(skip(doc))]
pub fn build_catalog<D>(doc: &D, page: usize) -> Result<Vec<PageObject>>
where
    D: DocumentAccess + ?Sized,
{
    let mut objects = Vec::new();

    for image in doc.images(page)? {
        objects.push(PageObject::Image {
            bbox: image.bbox,
            resource: image.resource,
            width_px: image.width_px,
            height_px: image.height_px,
        });
    }

    for drawing in doc.drawings(page)? {
        objects.push(PageObject::Vector {
            bbox: drawing.bbox,
            path_kind: drawing.kind,
        });
    }

    for block in doc.text_blocks(page)? {
        if block.kind != BlockKind::Text {
            continue;
        }
        let content = block.content.trim();
        if content.is_empty() {
            continue;
        }
        objects.push(PageObject::Text {
            bbox: block.bbox,
            content: content.to_string(),
        });
    }

    debug!(objects = objects.len(), "Catalog built");
    Ok(objects)
}

/// Shorten `text` to at most `max_chars` characters, marking the cut with
/// `...`. Newlines are flattened to spaces.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let mut short: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        short.push_str("...");
    }
    short.replace('\n', " ")
}

/// Listing labels for a whole catalog, in catalog order, each numbered
/// 1-based within its kind.
pub fn catalog_labels(objects: &[PageObject], snippet_len: usize) -> Vec<String> {
    let mut counts = [0usize; 3];
    objects
        .iter()
        .map(|object| {
            let slot = match object.kind() {
                ObjectKind::Image => 0,
                ObjectKind::Vector => 1,
                ObjectKind::Text => 2,
            };
            counts[slot] += 1;
            format_label(object, counts[slot], snippet_len)
        })
        .collect()
}

fn format_label(object: &PageObject, ordinal: usize, snippet_len: usize) -> String {
    match object {
        PageObject::Image {
            resource,
            width_px,
            height_px,
            ..
        } => format!("Image {ordinal} [ID:{resource}] | Size: {width_px}x{height_px}"),
        PageObject::Vector { path_kind, .. } => {
            format!("Vector {ordinal} | Type: {}", path_kind.label())
        }
        PageObject::Text { content, .. } => {
            format!("Text {ordinal} | \"{}\"", snippet(content, snippet_len))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfsweep_core::types::{PathKind, Rect, ResourceId};

    fn sample() -> Vec<PageObject> {
        vec![
            PageObject::Image {
                bbox: Rect::new(0.0, 0.0, 10.0, 10.0),
                resource: ResourceId::new(12, 0),
                width_px: 640,
                height_px: 480,
            },
            PageObject::Vector {
                bbox: Rect::new(0.0, 0.0, 5.0, 5.0),
                path_kind: PathKind::FillStroke,
            },
            PageObject::Text {
                bbox: Rect::new(0.0, 0.0, 50.0, 10.0),
                content: "Quarterly\nreport".into(),
            },
            PageObject::Text {
                bbox: Rect::new(0.0, 20.0, 50.0, 30.0),
                content: "Draft".into(),
            },
        ]
    }

    #[test]
    fn labels_are_numbered_per_kind() {
        let labels = catalog_labels(&sample(), 40);
        assert_eq!(
            labels,
            vec![
                "Image 1 [ID:12] | Size: 640x480",
                "Vector 1 | Type: fs",
                "Text 1 | \"Quarterly report\"",
                "Text 2 | \"Draft\"",
            ]
        );
    }

    #[test]
    fn snippets_are_truncated() {
        let long = "a".repeat(45);
        assert_eq!(snippet(&long, 40), format!("{}...", "a".repeat(40)));
        assert_eq!(snippet("short", 40), "short");
        assert_eq!(snippet(&"b".repeat(40), 40), "b".repeat(40));
    }
}
