// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redaction — patches a page's content, and the forms it paints, so that
// glyphs inside the redaction areas are gone from the streams, not merely
// covered.
//
// A showing operator that loses glyphs is rebuilt as a TJ array. Each removed
// glyph is replaced by a numeric adjustment of the same advance, so the text
// that remains keeps its original position.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use lopdf::content::Operation;
use lopdf::{Object, StringFormat};
use pdfsweep_core::types::{ImageRedaction, Rect};

use super::interpreter::{PageLayout, PlacedGlyph};
use super::objects::number;
use super::patch::LayoutPatch;

/// What a redaction pass changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RedactionStats {
    pub glyphs_removed: usize,
    pub images_removed: usize,
}

/// Patch out glyphs whose centre lies in any of `areas` and, when asked,
/// image placements that overlap one.
pub(crate) fn redact_layout(
    layout: &PageLayout,
    areas: &[Rect],
    images: ImageRedaction,
) -> (LayoutPatch, RedactionStats) {
    let mut stats = RedactionStats::default();

    let removed: HashSet<usize> = layout
        .glyphs
        .iter()
        .enumerate()
        .filter(|(_, glyph)| {
            let (cx, cy) = glyph.bbox.center();
            areas.iter().any(|area| area.contains_point(cx, cy))
        })
        .map(|(index, _)| index)
        .collect();
    stats.glyphs_removed = removed.len();

    // Glyphs of every operator that loses at least one, keyed by
    // (stream, op index).
    let mut touched: BTreeMap<(Option<usize>, usize), Vec<usize>> = BTreeMap::new();
    let touched_ops: BTreeSet<(Option<usize>, usize)> = removed
        .iter()
        .map(|&i| (layout.glyphs[i].stream, layout.glyphs[i].op_index))
        .collect();
    for (index, glyph) in layout.glyphs.iter().enumerate() {
        let key = (glyph.stream, glyph.op_index);
        if touched_ops.contains(&key) {
            touched.entry(key).or_default().push(index);
        }
    }

    let mut patch = LayoutPatch::default();
    if images == ImageRedaction::Remove {
        for placement in &layout.images {
            if areas.iter().any(|area| area.intersects(&placement.bbox)) {
                patch.stream_mut(placement.stream).insert(placement.op_index, Vec::new());
                stats.images_removed += 1;
            }
        }
    }

    for (&(stream, op_index), indices) in &touched {
        let Some(op) = layout.stream_operations(stream).and_then(|ops| ops.get(op_index)) else {
            continue;
        };
        let glyphs: Vec<&PlacedGlyph> = indices.iter().map(|&i| &layout.glyphs[i]).collect();
        let gone: Vec<bool> = indices.iter().map(|i| removed.contains(i)).collect();
        patch.stream_mut(stream).insert(op_index, rewrite_show(op, &glyphs, &gone));
    }
    (patch, stats)
}

/// Rebuild one text-showing operator without the glyphs flagged in `gone`.
fn rewrite_show(op: &Operation, glyphs: &[&PlacedGlyph], gone: &[bool]) -> Vec<Operation> {
    let mut prefix = Vec::new();
    let elements: Vec<Object> = match op.operator.as_str() {
        "TJ" => match op.operands.first() {
            Some(Object::Array(items)) => items.clone(),
            _ => return vec![op.clone()],
        },
        "Tj" => op.operands.first().cloned().into_iter().collect(),
        "'" => {
            prefix.push(Operation::new("T*", vec![]));
            op.operands.first().cloned().into_iter().collect()
        }
        "\"" => {
            let word = op.operands.first().cloned().unwrap_or(Object::Integer(0));
            let chars = op.operands.get(1).cloned().unwrap_or(Object::Integer(0));
            prefix.push(Operation::new("Tw", vec![word]));
            prefix.push(Operation::new("Tc", vec![chars]));
            prefix.push(Operation::new("T*", vec![]));
            op.operands.get(2).cloned().into_iter().collect()
        }
        _ => return vec![op.clone()],
    };

    let mut rebuilt: Vec<Object> = Vec::new();
    for (element, item) in elements.iter().enumerate() {
        let Object::String(bytes, format) = item else {
            if let Some(amount) = number(item) {
                push_adjustment(&mut rebuilt, amount);
            }
            continue;
        };

        let mut pieces: Vec<(&PlacedGlyph, bool)> = glyphs
            .iter()
            .zip(gone)
            .filter(|(glyph, _)| glyph.element == element)
            .map(|(glyph, gone)| (*glyph, *gone))
            .collect();
        pieces.sort_by_key(|(glyph, _)| glyph.bytes.start);

        let mut kept: Vec<u8> = Vec::new();
        for (glyph, gone) in pieces {
            if gone {
                flush(&mut rebuilt, &mut kept, *format);
                push_adjustment(&mut rebuilt, glyph.gap);
            } else if let Some(code) = bytes.get(glyph.bytes.clone()) {
                kept.extend_from_slice(code);
            }
        }
        flush(&mut rebuilt, &mut kept, *format);
    }

    prefix.push(Operation::new("TJ", vec![Object::Array(rebuilt)]));
    prefix
}

fn flush(target: &mut Vec<Object>, kept: &mut Vec<u8>, format: StringFormat) {
    if !kept.is_empty() {
        target.push(Object::String(std::mem::take(kept), format));
    }
}

/// Append a TJ adjustment, merging with a preceding one.
fn push_adjustment(target: &mut Vec<Object>, amount: f32) {
    if let Some(last) = target.last_mut() {
        if let Some(previous) = number(last) {
            *last = Object::Real((previous + amount).into());
            return;
        }
    }
    target.push(Object::Real(amount.into()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::interpreter::layout_for;
    use crate::pdf::patch::apply_patch;

    /// Page operators after redacting `areas`.
    fn redacted(
        layout: &PageLayout,
        areas: &[Rect],
        images: ImageRedaction,
    ) -> (Vec<Operation>, RedactionStats) {
        let (patch, stats) = redact_layout(layout, areas, images);
        (apply_patch(&layout.operations, &patch.page), stats)
    }

    fn shown_text(operations: &[Operation]) -> String {
        let mut out = Vec::new();
        for op in operations {
            for operand in &op.operands {
                match operand {
                    Object::String(bytes, _) => out.extend_from_slice(bytes),
                    Object::Array(items) => {
                        for item in items {
                            if let Object::String(bytes, _) = item {
                                out.extend_from_slice(bytes);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    #[test]
    fn glyphs_inside_area_are_removed() {
        let layout = layout_for("BT /F1 10 Tf 100 700 Td (SECRET plan) Tj ET");
        let hit = &layout.search("SECRET")[0];
        let (operations, stats) = redacted(&layout, &hit.rects, ImageRedaction::None);
        assert_eq!(stats.glyphs_removed, 6);
        assert_eq!(shown_text(&operations), " plan");
        assert!(operations.iter().any(|op| op.operator == "TJ"));
    }

    #[test]
    fn removed_glyphs_keep_following_text_in_place() {
        let layout = layout_for("BT /F1 10 Tf 100 700 Td (ab) Tj ET");
        let area = layout.glyphs[0].bbox;
        let (operations, _) = redacted(&layout, &[area], ImageRedaction::None);
        let tj = operations.iter().find(|op| op.operator == "TJ").unwrap();
        let Object::Array(items) = &tj.operands[0] else {
            panic!("TJ without array");
        };
        // 5pt glyph at 10pt size => -500 thousandths.
        assert_eq!(number(&items[0]), Some(-500.0));
        assert!(matches!(&items[1], Object::String(bytes, _) if bytes == b"b"));
    }

    #[test]
    fn untouched_operators_are_preserved() {
        let layout = layout_for("BT /F1 10 Tf 100 700 Td (keep) Tj ET BT 100 100 Td (drop) Tj ET");
        let hit = &layout.search("drop")[0];
        let (operations, _) = redacted(&layout, &hit.rects, ImageRedaction::None);
        assert_eq!(operations.len(), layout.operations.len());
        assert_eq!(operations[3].operator, "Tj");
        assert_eq!(shown_text(&operations), "keep");
    }

    #[test]
    fn quote_operators_keep_line_movement() {
        let layout = layout_for("BT /F1 10 Tf 12 TL 100 700 Td (x) Tj (gone) ' ET");
        let hit = &layout.search("gone")[0];
        let (operations, _) = redacted(&layout, &hit.rects, ImageRedaction::None);
        assert!(operations.iter().any(|op| op.operator == "T*"));
        assert!(!operations.iter().any(|op| op.operator == "'"));
    }

    #[test]
    fn no_areas_changes_nothing() {
        let layout = layout_for("BT /F1 10 Tf 100 700 Td (text) Tj ET");
        let (operations, stats) = redacted(&layout, &[], ImageRedaction::Remove);
        assert_eq!(operations.len(), layout.operations.len());
        assert_eq!(shown_text(&operations), "text");
        assert_eq!(stats, RedactionStats::default());
    }
}
