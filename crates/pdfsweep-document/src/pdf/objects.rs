// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// lopdf object helpers — reference resolution, inherited page attributes,
// and content stream access.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdfsweep_core::error::SweepError;

/// Reference chains longer than this are treated as broken.
const MAX_REFERENCE_DEPTH: usize = 16;

/// Follow indirect references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a Document, mut object: &'a Object) -> Result<&'a Object, SweepError> {
    for _ in 0..MAX_REFERENCE_DEPTH {
        match object {
            Object::Reference(id) => {
                object = doc.get_object(*id).map_err(|err| {
                    SweepError::Pdf(format!("cannot resolve object {} {}: {}", id.0, id.1, err))
                })?;
            }
            other => return Ok(other),
        }
    }
    Err(SweepError::Pdf("reference chain too deep".into()))
}

/// Resolve `object` and require a dictionary.
pub(crate) fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Dictionary, SweepError> {
    match resolve(doc, object)? {
        Object::Dictionary(dict) => Ok(dict),
        Object::Stream(stream) => Ok(&stream.dict),
        _ => Err(SweepError::Pdf("expected a dictionary".into())),
    }
}

/// Numeric value of an integer or real object.
pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

/// Look up `key` on a page, walking up the /Parent chain for inheritable
/// attributes such as /Resources and /MediaBox.
pub(crate) fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, SweepError> {
    let mut node_id = page_id;
    for _ in 0..MAX_REFERENCE_DEPTH {
        let node = doc.get_dictionary(node_id).map_err(|err| {
            SweepError::Pdf(format!("page tree node {} unreadable: {}", node_id.0, err))
        })?;
        if let Ok(value) = node.get(key) {
            return Ok(Some(value));
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(parent)) => node_id = *parent,
            _ => return Ok(None),
        }
    }
    Ok(None)
}

/// The page's MediaBox as `[llx, lly, urx, ury]`, defaulting to US Letter.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> Result<[f32; 4], SweepError> {
    let Some(object) = inherited(doc, page_id, b"MediaBox")? else {
        return Ok([0.0, 0.0, 612.0, 792.0]);
    };
    let values: Vec<f32> = match resolve(doc, object)? {
        Object::Array(items) => items
            .iter()
            .filter_map(|item| resolve(doc, item).ok().and_then(number))
            .collect(),
        _ => Vec::new(),
    };
    if values.len() != 4 {
        return Err(SweepError::Pdf("malformed /MediaBox".into()));
    }
    Ok([
        values[0].min(values[2]),
        values[1].min(values[3]),
        values[0].max(values[2]),
        values[1].max(values[3]),
    ])
}

/// The page's effective resource dictionary, or an empty one.
pub(crate) fn page_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, SweepError> {
    match inherited(doc, page_id, b"Resources")? {
        Some(object) => Ok(resolve_dict(doc, object)?.clone()),
        None => Ok(Dictionary::new()),
    }
}

/// A named sub-dictionary of a resource dictionary (/Font, /XObject, ...).
pub(crate) fn resource_category(doc: &Document, resources: &Dictionary, category: &[u8]) -> Dictionary {
    resources
        .get(category)
        .ok()
        .and_then(|object| resolve_dict(doc, object).ok())
        .cloned()
        .unwrap_or_else(Dictionary::new)
}

/// Concatenated, decompressed content of every stream in /Contents.
pub(crate) fn page_content_bytes(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>, SweepError> {
    let page = doc
        .get_dictionary(page_id)
        .map_err(|err| SweepError::Pdf(format!("cannot read page object: {}", err)))?;

    let contents = match page.get(b"Contents") {
        Ok(object) => object,
        Err(_) => return Ok(Vec::new()),
    };

    let mut content = Vec::new();
    match resolve(doc, contents)? {
        Object::Stream(stream) => content.extend(decode_stream(stream)?),
        Object::Array(parts) => {
            for part in parts {
                if let Object::Stream(stream) = resolve(doc, part)? {
                    if !content.is_empty() {
                        content.push(b'\n');
                    }
                    content.extend(decode_stream(stream)?);
                }
            }
        }
        _ => return Err(SweepError::Pdf("/Contents is not a stream or array".into())),
    }
    Ok(content)
}

/// Decode a stream's data, decompressing when a filter is present.
pub(crate) fn decode_stream(stream: &Stream) -> Result<Vec<u8>, SweepError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|err| SweepError::Pdf(format!("failed to decompress content stream: {}", err)))
    } else {
        Ok(stream.content.clone())
    }
}

/// Replace the page's content with `content`, stored in a fresh stream object
/// so that streams shared with other pages are left intact.
pub(crate) fn replace_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> Result<(), SweepError> {
    let stream_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), content)));
    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|err| SweepError::Mutation(format!("cannot update page object: {}", err)))?;
    page.set("Contents", Object::Reference(stream_id));
    Ok(())
}
