// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PdfDocument — the lopdf-backed implementation of the document capability
// traits. Opens a file, answers page introspection queries through the
// content interpreter, and applies image detachment and redaction in memory.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use lopdf::content::Operation;
use lopdf::{Document, Object, ObjectId};
use pdfsweep_core::error::{Result, SweepError};
use pdfsweep_core::types::{ImageRedaction, Rect, ResourceId, SaveOptions};
use tracing::{debug, info, instrument, warn};

use super::interpreter::{PageLayout, PageSpace, interpret_page};
use super::objects::{media_box, page_resources, resolve, resource_category};
use super::patch::{LayoutPatch, PageUpdate, commit};
use super::redact::redact_layout;
use crate::access::{
    DocumentAccess, DocumentEditor, DrawingInfo, ImageInfo, PageSize, TextBlock, TextHit,
};

/// An open PDF document.
///
/// Edits happen on the in-memory `lopdf::Document`; nothing reaches disk
/// until [`DocumentEditor::save`].
pub struct PdfDocument {
    /// The underlying lopdf document.
    document: Document,
    /// Page object ids in page order.
    page_ids: Vec<ObjectId>,
    /// Redaction areas queued per page, awaiting `apply_redactions`.
    pending: BTreeMap<usize, Vec<Rect>>,
    /// Fill colour painted over applied redactions; `None` leaves no mark.
    redaction_fill: Option<[f32; 3]>,
}

impl PdfDocument {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            SweepError::DocumentLoad(format!("{}: {}", path_ref.display(), err))
        })?;

        Self::from_document(document)
    }

    /// Load a PDF already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| SweepError::DocumentLoad(format!("in-memory PDF: {}", err)))?;

        Self::from_document(document)
    }

    fn from_document(document: Document) -> Result<Self> {
        // lopdf keys pages by 1-based page number; BTreeMap keeps them ordered.
        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(SweepError::EmptyDocument);
        }

        debug!(pages = page_ids.len(), "PDF loaded");

        Ok(Self {
            document,
            page_ids,
            pending: BTreeMap::new(),
            redaction_fill: None,
        })
    }

    // -- Accessors ------------------------------------------------------------

    /// Paint applied redactions with an RGB fill (components in 0..=1).
    pub fn set_redaction_fill(&mut self, fill: Option<[f32; 3]>) {
        self.redaction_fill = fill;
    }

    /// Number of redaction areas queued on `page`.
    pub fn pending_redactions(&self, page: usize) -> usize {
        self.pending.get(&page).map_or(0, Vec::len)
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        self.page_ids
            .get(page)
            .copied()
            .ok_or(SweepError::PageOutOfRange {
                index: page,
                count: self.page_ids.len(),
            })
    }

    fn layout(&self, page: usize) -> Result<PageLayout> {
        interpret_page(&self.document, self.page_id(page)?)
    }

    /// Catalog entry for image object `id`, or `None` if it is not an image.
    fn image_info(&self, id: ObjectId, layout: &PageLayout) -> Option<ImageInfo> {
        let reference = Object::Reference(id);
        let Ok(Object::Stream(stream)) = resolve(&self.document, &reference) else {
            return None;
        };
        let is_image = stream
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .map(|subtype| subtype == b"Image")
            .unwrap_or(false);
        if !is_image {
            return None;
        }
        let dimension = |key: &[u8]| -> u32 {
            stream
                .dict
                .get(key)
                .ok()
                .and_then(|value| resolve(&self.document, value).ok())
                .and_then(|value| value.as_i64().ok())
                .and_then(|value| u32::try_from(value).ok())
                .unwrap_or(0)
        };
        Some(ImageInfo {
            resource: ResourceId::from(id),
            bbox: layout.image_bbox(id).unwrap_or_else(Rect::empty),
            width_px: dimension(b"Width"),
            height_px: dimension(b"Height"),
        })
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise a compacted copy of the document.
    ///
    /// The copy is pruned of unreachable objects, renumbered, and compressed
    /// as `options` asks; `self` is not modified.
    #[instrument(skip_all)]
    pub fn to_bytes(&self, options: &SaveOptions) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.compacted(options)
            .save_to(&mut output)
            .map_err(|err| SweepError::Save(format!("failed to serialise PDF: {}", err)))?;
        debug!(output_bytes = output.len(), "PDF serialised");
        Ok(output)
    }

    fn compacted(&self, options: &SaveOptions) -> Document {
        let mut doc = self.document.clone();
        if options.prune_unused {
            let pruned = doc.prune_objects();
            doc.delete_zero_length_streams();
            debug!(pruned = pruned.len(), "Unreferenced objects pruned");
        }
        if options.renumber {
            doc.renumber_objects();
        }
        if options.compress {
            doc.compress();
        }
        doc
    }

}

impl DocumentAccess for PdfDocument {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_size(&self, page: usize) -> Result<PageSize> {
        let space = PageSpace::from_media_box(media_box(&self.document, self.page_id(page)?)?);
        Ok(PageSize {
            width: space.width(),
            height: space.height(),
        })
    }

    /// Images in the page's resources, then images painted by its forms.
    fn images(&self, page: usize) -> Result<Vec<ImageInfo>> {
        let page_id = self.page_id(page)?;
        let layout = self.layout(page)?;
        let resources = page_resources(&self.document, page_id)?;
        let xobjects = resource_category(&self.document, &resources, b"XObject");

        let listed = xobjects.iter().filter_map(|(_, entry)| match entry {
            Object::Reference(id) => Some(*id),
            _ => None,
        });
        let in_forms = layout
            .images
            .iter()
            .filter(|placement| placement.stream.is_some())
            .filter_map(|placement| placement.id);

        let mut seen = HashSet::new();
        let mut images = Vec::new();
        for id in listed.chain(in_forms) {
            if seen.insert(id)
                && let Some(info) = self.image_info(id, &layout)
            {
                images.push(info);
            }
        }
        Ok(images)
    }

    fn drawings(&self, page: usize) -> Result<Vec<DrawingInfo>> {
        Ok(self.layout(page)?.drawings)
    }

    fn text_blocks(&self, page: usize) -> Result<Vec<TextBlock>> {
        Ok(self.layout(page)?.text_blocks())
    }

    fn search_text(&self, page: usize, needle: &str) -> Result<Vec<TextHit>> {
        Ok(self.layout(page)?.search(needle))
    }
}

impl DocumentEditor for PdfDocument {
    #[instrument(skip(self))]
    fn detach_image(&mut self, page: usize, resource: ResourceId) -> Result<bool> {
        let page_id = self.page_id(page)?;
        let target: ObjectId = resource.into();
        let layout = self.layout(page)?;

        let mut resources = page_resources(&self.document, page_id)?;
        let mut xobjects = resource_category(&self.document, &resources, b"XObject");
        let names: Vec<Vec<u8>> = xobjects
            .iter()
            .filter(|(_, entry)| matches!(entry, Object::Reference(id) if *id == target))
            .map(|(name, _)| name.clone())
            .collect();

        let mut patch = LayoutPatch::default();
        for (index, op) in layout.operations.iter().enumerate() {
            if op.operator == "Do"
                && matches!(op.operands.first(), Some(Object::Name(name)) if names.contains(name))
            {
                patch.page.insert(index, Vec::new());
            }
        }
        // Paintings inside forms are dropped from per-page copies of the forms.
        for placement in &layout.images {
            if placement.stream.is_some() && placement.id == Some(target) {
                patch.stream_mut(placement.stream).insert(placement.op_index, Vec::new());
            }
        }
        let in_forms = patch.forms.len();
        if names.is_empty() && in_forms == 0 {
            return Ok(false);
        }

        // The page gets its own copy of the resources, so pages sharing an
        // inherited or indirect resource dictionary keep theirs.
        let resources = if names.is_empty() {
            None
        } else {
            for name in &names {
                xobjects.remove(name);
            }
            resources.set("XObject", Object::Dictionary(xobjects));
            Some(resources)
        };
        commit(
            &mut self.document,
            page_id,
            &layout,
            PageUpdate {
                patch,
                resources,
                overlay: Vec::new(),
            },
        )?;

        info!(names = names.len(), forms = in_forms, "Image detached from page");
        Ok(true)
    }

    fn add_redaction(&mut self, page: usize, area: Rect) -> Result<()> {
        self.page_id(page)?;
        self.pending.entry(page).or_default().push(area);
        Ok(())
    }

    #[instrument(skip(self))]
    fn apply_redactions(&mut self, page: usize, images: ImageRedaction) -> Result<usize> {
        let page_id = self.page_id(page)?;
        let areas = self.pending.remove(&page).unwrap_or_default();
        if areas.is_empty() {
            return Ok(0);
        }

        let layout = self.layout(page)?;
        let (patch, stats) = redact_layout(&layout, &areas, images);
        if patch.is_empty() {
            warn!(areas = areas.len(), "Redaction areas cover no content");
        }

        let mut overlay = Vec::new();
        if let Some([r, g, b]) = self.redaction_fill {
            overlay.push(Operation::new(
                "rg",
                vec![Object::Real(r.into()), Object::Real(g.into()), Object::Real(b.into())],
            ));
            for area in &areas {
                let (x, y, w, h) = layout.space.to_user_rect(area);
                overlay.push(Operation::new(
                    "re",
                    vec![
                        Object::Real(x.into()),
                        Object::Real(y.into()),
                        Object::Real(w.into()),
                        Object::Real(h.into()),
                    ],
                ));
                overlay.push(Operation::new("f", vec![]));
            }
        }

        commit(
            &mut self.document,
            page_id,
            &layout,
            PageUpdate {
                patch,
                resources: None,
                overlay,
            },
        )?;
        debug!(
            areas = areas.len(),
            glyphs = stats.glyphs_removed,
            images = stats.images_removed,
            "Redactions applied"
        );
        Ok(areas.len())
    }

    #[instrument(skip(self, options), fields(path = %path.display()))]
    fn save(&self, path: &Path, options: &SaveOptions) -> Result<()> {
        info!("Saving PDF");
        let file = File::create(path)
            .map_err(|err| SweepError::Save(format!("cannot create {}: {}", path.display(), err)))?;
        let mut writer = BufWriter::new(file);
        self.compacted(options)
            .save_to(&mut writer)
            .map_err(|err| SweepError::Save(format!("cannot write {}: {}", path.display(), err)))?;
        writer
            .flush()
            .map_err(|err| SweepError::Save(format!("cannot write {}: {}", path.display(), err)))?;
        Ok(())
    }
}
