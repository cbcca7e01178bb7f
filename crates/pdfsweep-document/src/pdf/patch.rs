// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content patches — operator replacements for a page's content stream and
// the form XObjects it paints, and how they are written back.
//
// Form streams are shared: the same object may be painted on every page.
// An edited form painting is therefore written as a new stream object under
// a fresh resource name, and only the `Do` that painted it is pointed at the
// copy. Other pages, and other paintings on the same page, keep the original.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdfsweep_core::error::SweepError;
use tracing::debug;

use super::interpreter::PageLayout;
use super::objects::{page_resources, replace_page_content, resource_category};

/// Replacement operators for one stream, keyed by the index of the operator
/// they stand in for. An empty replacement deletes the operator.
pub(crate) type StreamPatch = BTreeMap<usize, Vec<Operation>>;

/// Patches for the page content and for each form painting of a layout.
#[derive(Debug, Clone, Default)]
pub(crate) struct LayoutPatch {
    pub page: StreamPatch,
    /// Keyed by index into `PageLayout::forms`.
    pub forms: BTreeMap<usize, StreamPatch>,
}

impl LayoutPatch {
    pub(crate) fn stream_mut(&mut self, stream: Option<usize>) -> &mut StreamPatch {
        match stream {
            None => &mut self.page,
            Some(index) => self.forms.entry(index).or_default(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.page.is_empty() && self.forms.values().all(BTreeMap::is_empty)
    }
}

/// `operations` with the replacements of `patch` spliced in.
pub(crate) fn apply_patch(operations: &[Operation], patch: &StreamPatch) -> Vec<Operation> {
    let mut out = Vec::with_capacity(operations.len());
    for (index, op) in operations.iter().enumerate() {
        match patch.get(&index) {
            Some(replacement) => out.extend(replacement.iter().cloned()),
            None => out.push(op.clone()),
        }
    }
    out
}

/// A change to one page, ready to be written.
#[derive(Debug, Default)]
pub(crate) struct PageUpdate {
    pub patch: LayoutPatch,
    /// Replacement page resources, when the caller edited them.
    pub resources: Option<Dictionary>,
    /// Operators painted over the page content.
    pub overlay: Vec<Operation>,
}

fn encode(operations: Vec<Operation>) -> Result<Vec<u8>, SweepError> {
    Content { operations }
        .encode()
        .map_err(|err| SweepError::Mutation(format!("cannot encode content stream: {}", err)))
}

/// `base` plus a numeric suffix, unused among `taken` and `added`.
fn fresh_name(base: &[u8], taken: &Dictionary, added: &[(Vec<u8>, ObjectId)]) -> Vec<u8> {
    (1u32..)
        .map(|n| {
            let mut name = base.to_vec();
            name.extend_from_slice(format!("_{n}").as_bytes());
            name
        })
        .find(|name| !taken.has(name) && added.iter().all(|(used, _)| used != name))
        .unwrap_or_else(|| base.to_vec())
}

fn add_xobjects(doc: &Document, resources: &mut Dictionary, added: Vec<(Vec<u8>, ObjectId)>) {
    let mut xobjects = resource_category(doc, resources, b"XObject");
    for (name, id) in added {
        xobjects.set(name, Object::Reference(id));
    }
    resources.set("XObject", Object::Dictionary(xobjects));
}

/// Write `update` for the page `layout` was interpreted from.
///
/// Edited form paintings are written innermost first so that each copy can
/// be registered with the (possibly also copied) stream that paints it.
pub(crate) fn commit(
    doc: &mut Document,
    page_id: ObjectId,
    layout: &PageLayout,
    update: PageUpdate,
) -> Result<(), SweepError> {
    let PageUpdate {
        mut patch,
        resources,
        overlay,
    } = update;
    let resources_changed = resources.is_some();
    let mut resources = match resources {
        Some(resources) => resources,
        None => page_resources(doc, page_id)?,
    };

    // XObject entries to add, per painting stream (`None` = page).
    let mut additions: BTreeMap<Option<usize>, Vec<(Vec<u8>, ObjectId)>> = BTreeMap::new();

    for index in (0..layout.forms.len()).rev() {
        let form_patch = patch.forms.remove(&index).filter(|p| !p.is_empty());
        let added = additions.remove(&Some(index));
        if form_patch.is_none() && added.is_none() {
            continue;
        }
        let form = &layout.forms[index];
        let content = encode(apply_patch(&form.operations, &form_patch.unwrap_or_default()))?;

        let mut dict = form.dict.clone();
        for key in [b"Filter".as_slice(), b"DecodeParms".as_slice(), b"Length".as_slice()] {
            dict.remove(key);
        }
        if let Some(added) = added {
            let mut form_resources = form.resources.clone();
            add_xobjects(doc, &mut form_resources, added);
            dict.set("Resources", Object::Dictionary(form_resources));
        }
        let copy_id = doc.add_object(Stream::new(dict, content));

        let parent_resources = match form.parent {
            None => &resources,
            Some(parent) => &layout.forms[parent].resources,
        };
        let taken = resource_category(doc, parent_resources, b"XObject");
        let siblings = additions.entry(form.parent).or_default();
        let name = fresh_name(&form.name, &taken, siblings);
        siblings.push((name.clone(), copy_id));
        debug!(
            form = %String::from_utf8_lossy(&form.name),
            copy = %String::from_utf8_lossy(&name),
            "form painting rewritten as a copy"
        );
        patch
            .stream_mut(form.parent)
            .insert(form.op_index, vec![Operation::new("Do", vec![Object::Name(name)])]);
    }

    let page_additions = additions.remove(&None);
    if patch.page.is_empty() && overlay.is_empty() && page_additions.is_none() && !resources_changed {
        return Ok(());
    }

    let mut operations = apply_patch(&layout.operations, &patch.page);
    if !overlay.is_empty() {
        operations.insert(0, Operation::new("q", vec![]));
        operations.push(Operation::new("Q", vec![]));
        operations.extend(overlay);
    }
    replace_page_content(doc, page_id, encode(operations)?)?;

    if page_additions.is_some() || resources_changed {
        if let Some(added) = page_additions {
            add_xobjects(doc, &mut resources, added);
        }
        let page = doc
            .get_dictionary_mut(page_id)
            .map_err(|err| SweepError::Mutation(format!("cannot update page object: {}", err)))?;
        page.set("Resources", Object::Dictionary(resources));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_replaces_and_deletes_operators() {
        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
            Operation::new("Q", vec![]),
        ];
        let mut patch = StreamPatch::new();
        patch.insert(1, Vec::new());
        patch.insert(2, vec![Operation::new("Q", vec![]), Operation::new("n", vec![])]);
        let out = apply_patch(&operations, &patch);
        let operators: Vec<&str> = out.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators, ["q", "Q", "n"]);
    }

    #[test]
    fn fresh_names_avoid_existing_and_pending_entries() {
        let mut taken = Dictionary::new();
        taken.set("Fm1_1", Object::Null);
        let pending = vec![(b"Fm1_2".to_vec(), (9, 0))];
        assert_eq!(fresh_name(b"Fm1", &taken, &pending), b"Fm1_3");
        assert_eq!(fresh_name(b"X", &Dictionary::new(), &[]), b"X_1");
    }

    #[test]
    fn empty_patch_reports_empty() {
        let mut patch = LayoutPatch::default();
        assert!(patch.is_empty());
        patch.stream_mut(Some(2));
        assert!(patch.is_empty());
        patch.stream_mut(None).insert(0, Vec::new());
        assert!(!patch.is_empty());
    }
}
