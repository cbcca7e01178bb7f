// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editing session — the one open document, the page being viewed, and the
// catalog of that page as of the last render.

use std::path::Path;

use pdfsweep_core::AppConfig;
use pdfsweep_core::error::{Result, SweepError};
use pdfsweep_core::types::{
    Confirmation, ObjectKind, PageObject, RemovalOutcome, RemovalRequest, RemovalScope,
    SaveOptions, TextMatchMethod,
};
use pdfsweep_document::access::DocumentAccess;
use pdfsweep_document::{
    DocumentEditor, PdfDocument, RemovalConfig, build_catalog, catalog_labels, remove_object,
    render_preview,
};
use tracing::{info, instrument};

/// A rendered page, ready for display.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub png: Vec<u8>,
    pub zoom: f32,
    pub labels: Vec<String>,
}

/// State of the open document. Holds no UI types so it can be driven from
/// tests as well as from the Dioxus pages.
#[derive(Default)]
pub struct Session {
    document: Option<PdfDocument>,
    document_name: Option<String>,
    current_page: usize,
    /// Catalog of `current_page` from the most recent render.
    catalog: Vec<PageObject>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Document lifecycle ---------------------------------------------------

    /// Open a PDF, replacing any document already open.
    #[instrument(skip(self, config), fields(path = %path.display()))]
    pub fn open(&mut self, path: &Path, config: &AppConfig) -> Result<usize> {
        let document = PdfDocument::open(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.pdf".into());
        Ok(self.install(document, name, config))
    }

    /// Make `document` the open document and show its first page.
    pub fn install(&mut self, mut document: PdfDocument, name: String, config: &AppConfig) -> usize {
        document.set_redaction_fill(config.redaction_fill);
        let pages = document.page_count();
        info!(pages, name = %name, "Document opened");
        self.document = Some(document);
        self.document_name = Some(name);
        self.current_page = 0;
        self.catalog.clear();
        pages
    }

    /// Carry settings that affect the open document over to it.
    pub fn apply_config(&mut self, config: &AppConfig) {
        if let Some(document) = self.document.as_mut() {
            document.set_redaction_fill(config.redaction_fill);
        }
    }

    pub fn is_open(&self) -> bool {
        self.document.is_some()
    }

    pub fn document_name(&self) -> Option<&str> {
        self.document_name.as_deref()
    }

    fn document(&self) -> Result<&PdfDocument> {
        self.document.as_ref().ok_or(SweepError::NoDocument)
    }

    fn document_mut(&mut self) -> Result<&mut PdfDocument> {
        self.document.as_mut().ok_or(SweepError::NoDocument)
    }

    // -- Navigation -----------------------------------------------------------

    pub fn page_count(&self) -> usize {
        self.document.as_ref().map_or(0, |doc| doc.page_count())
    }

    /// 0-based index of the page being viewed.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Move to `page` (0-based).
    pub fn go_to(&mut self, page: usize) -> Result<()> {
        let count = self.document()?.page_count();
        if page >= count {
            return Err(SweepError::PageOutOfRange { index: page, count });
        }
        self.current_page = page;
        Ok(())
    }

    pub fn next_page(&mut self) -> Result<()> {
        self.go_to(self.current_page + 1)
    }

    pub fn previous_page(&mut self) -> Result<()> {
        let page = self
            .current_page
            .checked_sub(1)
            .ok_or(SweepError::PageOutOfRange {
                index: 0,
                count: self.page_count(),
            })?;
        self.go_to(page)
    }

    // -- Rendering ------------------------------------------------------------

    /// Rebuild the current page's catalog and draw its preview.
    ///
    /// The catalog is replaced on every call; indices from an earlier render
    /// must not be reused after this.
    pub fn render(
        &mut self,
        selected: Option<usize>,
        max_width: u32,
        max_height: u32,
        snippet_len: usize,
    ) -> Result<RenderedPage> {
        let page = self.current_page;
        let document = self.document()?;
        let catalog = build_catalog(document, page)?;
        let preview = render_preview(
            document.page_size(page)?,
            &catalog,
            selected,
            max_width,
            max_height,
        )?;
        let rendered = RenderedPage {
            png: preview.to_png_bytes()?,
            zoom: preview.zoom,
            labels: catalog_labels(&catalog, snippet_len),
        };
        self.catalog = catalog;
        Ok(rendered)
    }

    /// Entry `index` of the last rendered catalog.
    pub fn object(&self, index: usize) -> Option<&PageObject> {
        self.catalog.get(index)
    }

    pub fn object_kind(&self, index: usize) -> Option<ObjectKind> {
        self.object(index).map(PageObject::kind)
    }

    // -- Editing --------------------------------------------------------------

    /// Remove catalog entry `index` of the current page.
    ///
    /// Fails with [`SweepError::StaleSelection`] when `index` is not in the
    /// catalog of the last render.
    pub fn remove(
        &mut self,
        index: usize,
        scope: RemovalScope,
        method: TextMatchMethod,
        confirmation: Confirmation,
        config: &RemovalConfig,
    ) -> Result<RemovalOutcome> {
        let target = self
            .object(index)
            .cloned()
            .ok_or(SweepError::StaleSelection { number: index + 1 })?;
        let request = RemovalRequest::new(target, self.current_page)
            .with_scope(scope)
            .with_text_method(method)
            .with_confirmation(confirmation);

        let outcome = remove_object(self.document_mut()?, &request, config)?;
        if matches!(outcome, RemovalOutcome::Removed { .. }) {
            // The old catalog describes content that may no longer exist.
            self.catalog.clear();
        }
        Ok(outcome)
    }

    /// Write the modified document to `path`.
    pub fn save(&self, path: &Path, options: &SaveOptions) -> Result<()> {
        self.document()?.save(path, options)
    }
}

/// Parse 1-based page input from the "go to" box into a 0-based index.
pub fn parse_page_input(input: &str, page_count: usize) -> Option<usize> {
    let number: usize = input.trim().parse().ok()?;
    (1..=page_count).contains(&number).then(|| number - 1)
}

/// Status line text for a removal outcome.
pub fn outcome_message(outcome: &RemovalOutcome, kind: ObjectKind, method: TextMatchMethod) -> String {
    match (outcome, kind) {
        (RemovalOutcome::Removed { count }, ObjectKind::Image) => {
            format!("Deleted {count} image instance(s). Remember to 'Save As...'")
        }
        (RemovalOutcome::Removed { count }, _) => {
            format!("Removed {count} text instance(s). Remember to 'Save As...'")
        }
        (RemovalOutcome::NoMatch, ObjectKind::Image) => "That image is no longer in the document.".into(),
        (RemovalOutcome::NoMatch, _) => match method {
            TextMatchMethod::ByLocationAndContent => "No other matching text blocks were found.".into(),
            TextMatchMethod::ByContentOnly => {
                "That text was not found anywhere else in the document.".into()
            }
        },
        (RemovalOutcome::Declined, _) => "Removal cancelled.".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Dictionary, Document, Object, Stream, dictionary};

    fn two_page_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let mut kids = Vec::new();
        for _ in 0..2 {
            let content = b"BT /F1 12 Tf 40 740 Td (DRAFT) Tj ET".to_vec();
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => 2 }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn open_session() -> Session {
        let mut session = Session::new();
        let document = PdfDocument::from_bytes(&two_page_pdf()).unwrap();
        session.install(document, "draft.pdf".into(), &AppConfig::default());
        session
    }

    #[test]
    fn operations_need_an_open_document() {
        let mut session = Session::new();
        assert!(!session.is_open());
        assert!(matches!(session.render(None, 100, 100, 40), Err(SweepError::NoDocument)));
        assert!(matches!(session.next_page(), Err(SweepError::NoDocument)));
    }

    #[test]
    fn navigation_stays_in_range() {
        let mut session = open_session();
        assert_eq!(session.page_count(), 2);
        session.next_page().unwrap();
        assert_eq!(session.current_page(), 1);
        assert!(session.next_page().is_err());
        assert_eq!(session.current_page(), 1);
        session.previous_page().unwrap();
        assert!(session.previous_page().is_err());
        assert_eq!(session.current_page(), 0);
    }

    #[test]
    fn render_lists_page_objects() {
        let mut session = open_session();
        let page = session.render(None, 306, 396, 40).unwrap();
        assert_eq!(page.labels, vec!["Text 1 | \"DRAFT\""]);
        assert!((page.zoom - 0.5).abs() < 1e-6);
        assert_eq!(session.object_kind(0), Some(ObjectKind::Text));
    }

    #[test]
    fn remove_then_rerender() {
        let mut session = open_session();
        session.render(None, 612, 792, 40).unwrap();
        let outcome = session
            .remove(
                0,
                RemovalScope::AllPages,
                TextMatchMethod::ByLocationAndContent,
                Confirmation::Approved,
                &RemovalConfig::default(),
            )
            .unwrap();
        assert_eq!(outcome, RemovalOutcome::Removed { count: 2 });
        assert!(session.object(0).is_none());

        assert!(session.render(None, 612, 792, 40).unwrap().labels.is_empty());
        session.next_page().unwrap();
        assert!(session.render(None, 612, 792, 40).unwrap().labels.is_empty());
    }

    #[test]
    fn removal_needs_a_current_listing() {
        let mut session = open_session();
        let remove = |session: &mut Session, index| {
            session.remove(
                index,
                RemovalScope::AllPages,
                TextMatchMethod::ByContentOnly,
                Confirmation::Approved,
                &RemovalConfig::default(),
            )
        };
        // Nothing rendered yet, so there is no listing to pick from.
        assert!(matches!(
            remove(&mut session, 0),
            Err(SweepError::StaleSelection { number: 1 })
        ));
        session.render(None, 612, 792, 40).unwrap();
        assert!(matches!(
            remove(&mut session, 5),
            Err(SweepError::StaleSelection { number: 6 })
        ));
        assert_eq!(remove(&mut session, 0).unwrap(), RemovalOutcome::Removed { count: 2 });
    }

    #[test]
    fn save_writes_file() {
        let session = open_session();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        session.save(&path, &SaveOptions::default()).unwrap();
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF-"));
    }

    #[test]
    fn page_input_is_one_based() {
        assert_eq!(parse_page_input("1", 3), Some(0));
        assert_eq!(parse_page_input(" 3 ", 3), Some(2));
        assert_eq!(parse_page_input("0", 3), None);
        assert_eq!(parse_page_input("4", 3), None);
        assert_eq!(parse_page_input("two", 3), None);
    }

    #[test]
    fn outcome_messages() {
        let removed = RemovalOutcome::Removed { count: 2 };
        assert!(outcome_message(&removed, ObjectKind::Image, TextMatchMethod::default()).starts_with("Deleted 2 image"));
        assert!(
            outcome_message(&RemovalOutcome::NoMatch, ObjectKind::Text, TextMatchMethod::ByContentOnly)
                .contains("not found anywhere")
        );
    }
}
