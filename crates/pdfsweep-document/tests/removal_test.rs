// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Removal policy tests against an in-memory document.

use std::collections::BTreeMap;
use std::path::Path;

use pdfsweep_core::error::{Result, SweepError};
use pdfsweep_core::types::{
    Confirmation, ImageRedaction, ObjectKind, PageObject, PathKind, Rect, RemovalOutcome,
    RemovalRequest, RemovalScope, ResourceId, SaveOptions, TextMatchMethod,
};
use pdfsweep_document::access::{
    BlockKind, DocumentAccess, DocumentEditor, DrawingInfo, ImageInfo, PageSize, TextBlock, TextHit,
};
use pdfsweep_document::removal::{RemovalPlan, plan_removal};
use pdfsweep_document::{RemovalConfig, build_catalog, remove_object};

// ---------------------------------------------------------------------------
// Fake document
// ---------------------------------------------------------------------------

#[derive(Default, Clone)]
struct FakePage {
    images: Vec<ImageInfo>,
    drawings: Vec<DrawingInfo>,
    blocks: Vec<TextBlock>,
}

#[derive(Default)]
struct FakeDocument {
    pages: Vec<FakePage>,
    pending: BTreeMap<usize, Vec<Rect>>,
    /// Every mutating call, in order, for asserting what was touched.
    calls: Vec<String>,
    fail_apply_on: Option<usize>,
}

impl FakeDocument {
    fn with_pages(count: usize) -> Self {
        Self {
            pages: vec![FakePage::default(); count],
            ..Self::default()
        }
    }

    fn page(&self, page: usize) -> Result<&FakePage> {
        self.pages.get(page).ok_or(SweepError::PageOutOfRange {
            index: page,
            count: self.pages.len(),
        })
    }

    fn add_image(&mut self, page: usize, number: u32) {
        self.pages[page].images.push(ImageInfo {
            resource: ResourceId::new(number, 0),
            bbox: Rect::new(50.0, 50.0, 150.0, 150.0),
            width_px: 100,
            height_px: 100,
        });
    }

    fn add_text(&mut self, page: usize, x: f32, y: f32, content: &str) {
        self.pages[page].blocks.push(TextBlock {
            bbox: Rect::new(x, y, x + 120.0, y + 12.0),
            content: content.to_string(),
            kind: BlockKind::Text,
        });
    }

    fn texts(&self, page: usize) -> Vec<&str> {
        self.pages[page]
            .blocks
            .iter()
            .map(|block| block.content.as_str())
            .collect()
    }
}

impl DocumentAccess for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page: usize) -> Result<PageSize> {
        self.page(page)?;
        Ok(PageSize {
            width: 612.0,
            height: 792.0,
        })
    }

    fn images(&self, page: usize) -> Result<Vec<ImageInfo>> {
        Ok(self.page(page)?.images.clone())
    }

    fn drawings(&self, page: usize) -> Result<Vec<DrawingInfo>> {
        Ok(self.page(page)?.drawings.clone())
    }

    fn text_blocks(&self, page: usize) -> Result<Vec<TextBlock>> {
        Ok(self.page(page)?.blocks.clone())
    }

    fn search_text(&self, page: usize, needle: &str) -> Result<Vec<TextHit>> {
        let mut hits = Vec::new();
        for block in &self.page(page)?.blocks {
            for _ in block.content.matches(needle) {
                hits.push(TextHit {
                    rects: vec![block.bbox],
                });
            }
        }
        Ok(hits)
    }
}

impl DocumentEditor for FakeDocument {
    fn detach_image(&mut self, page: usize, resource: ResourceId) -> Result<bool> {
        self.calls.push(format!("detach {page} {resource}"));
        let images = &mut self.pages[page].images;
        let before = images.len();
        images.retain(|image| image.resource != resource);
        Ok(images.len() != before)
    }

    fn add_redaction(&mut self, page: usize, area: Rect) -> Result<()> {
        self.page(page)?;
        self.calls.push(format!("redact {page}"));
        self.pending.entry(page).or_default().push(area);
        Ok(())
    }

    fn apply_redactions(&mut self, page: usize, images: ImageRedaction) -> Result<usize> {
        assert_eq!(images, ImageRedaction::None, "text removal must not strip images");
        if self.fail_apply_on == Some(page) {
            return Err(SweepError::Pdf("content stream rejected".into()));
        }
        self.calls.push(format!("apply {page}"));
        let areas = self.pending.remove(&page).unwrap_or_default();
        self.pages[page].blocks.retain(|block| {
            let (cx, cy) = block.bbox.center();
            !areas.iter().any(|area| area.contains_point(cx, cy))
        });
        Ok(areas.len())
    }

    fn save(&self, _path: &Path, _options: &SaveOptions) -> Result<()> {
        Ok(())
    }
}

fn image_target(number: u32) -> PageObject {
    PageObject::Image {
        bbox: Rect::new(50.0, 50.0, 150.0, 150.0),
        resource: ResourceId::new(number, 0),
        width_px: 100,
        height_px: 100,
    }
}

fn text_target(x: f32, y: f32, content: &str) -> PageObject {
    PageObject::Text {
        bbox: Rect::new(x, y, x + 120.0, y + 12.0),
        content: content.to_string(),
    }
}

/// "CONFIDENTIAL" at (10,10) on pages 1 and 2, at (400,400) on page 3.
fn confidential_document() -> FakeDocument {
    let mut doc = FakeDocument::with_pages(3);
    doc.add_text(0, 10.0, 10.0, "CONFIDENTIAL");
    doc.add_text(1, 10.0, 10.0, "CONFIDENTIAL");
    doc.add_text(2, 400.0, 400.0, "CONFIDENTIAL");
    for page in 0..3 {
        doc.add_text(page, 10.0, 700.0, "Body text");
    }
    doc
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[test]
fn image_removed_from_every_page_that_holds_it() {
    let mut doc = FakeDocument::with_pages(3);
    doc.add_image(0, 7);
    doc.add_image(1, 9);
    doc.add_image(2, 7);

    let request = RemovalRequest::new(image_target(7), 0);
    let outcome = remove_object(&mut doc, &request, &RemovalConfig::default()).unwrap();

    assert_eq!(outcome, RemovalOutcome::Removed { count: 2 });
    assert!(doc.pages[0].images.is_empty());
    assert_eq!(doc.pages[1].images.len(), 1);
    assert!(doc.pages[2].images.is_empty());
    assert_eq!(doc.calls, vec!["detach 0 7", "detach 2 7"]);
}

#[test]
fn image_current_page_only_leaves_other_pages() {
    let mut doc = FakeDocument::with_pages(3);
    doc.add_image(0, 7);
    doc.add_image(2, 7);

    let request = RemovalRequest::new(image_target(7), 2).with_scope(RemovalScope::CurrentPageOnly);
    let outcome = remove_object(&mut doc, &request, &RemovalConfig::default()).unwrap();

    assert_eq!(outcome, RemovalOutcome::Removed { count: 1 });
    assert_eq!(doc.pages[0].images.len(), 1);
    assert!(doc.pages[2].images.is_empty());
}

#[test]
fn missing_image_is_no_match() {
    let mut doc = FakeDocument::with_pages(2);
    doc.add_image(0, 3);

    let request = RemovalRequest::new(image_target(7), 0);
    let outcome = remove_object(&mut doc, &request, &RemovalConfig::default()).unwrap();

    assert_eq!(outcome, RemovalOutcome::NoMatch);
    assert!(doc.calls.is_empty());
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

#[test]
fn text_by_location_matches_same_place_only() {
    let mut doc = confidential_document();
    let request = RemovalRequest::new(text_target(10.0, 10.0, "CONFIDENTIAL"), 0)
        .with_text_method(TextMatchMethod::ByLocationAndContent);

    let outcome = remove_object(&mut doc, &request, &RemovalConfig::default()).unwrap();

    assert_eq!(outcome, RemovalOutcome::Removed { count: 2 });
    assert_eq!(doc.texts(0), vec!["Body text"]);
    assert_eq!(doc.texts(1), vec!["Body text"]);
    assert_eq!(doc.texts(2), vec!["CONFIDENTIAL", "Body text"]);
}

#[test]
fn text_by_content_matches_everywhere() {
    let mut doc = confidential_document();
    let request = RemovalRequest::new(text_target(10.0, 10.0, "CONFIDENTIAL"), 0)
        .with_text_method(TextMatchMethod::ByContentOnly);

    let outcome = remove_object(&mut doc, &request, &RemovalConfig::default()).unwrap();

    assert_eq!(outcome, RemovalOutcome::Removed { count: 3 });
    for page in 0..3 {
        assert_eq!(doc.texts(page), vec!["Body text"]);
    }
}

#[test]
fn location_tolerance_boundary() {
    let mut doc = FakeDocument::with_pages(1);
    doc.add_text(0, 12.0, 8.0, "Stamp");
    doc.add_text(0, 12.5, 300.0, "Stamp");
    doc.add_text(0, 10.0, 502.5, "Stamp");

    let config = RemovalConfig::default();
    let accepted = RemovalRequest::new(text_target(10.0, 10.0, "Stamp"), 0);
    let plan = plan_removal(&doc, &accepted, &config).unwrap();
    assert!(matches!(plan, Some(RemovalPlan::Redact { matches: 1, .. })));

    let rejected = RemovalRequest::new(text_target(10.0, 298.0, "Stamp"), 0);
    assert_eq!(plan_removal(&doc, &rejected, &config).unwrap(), None);

    let rejected_y = RemovalRequest::new(text_target(10.0, 500.0, "Stamp"), 0);
    assert_eq!(plan_removal(&doc, &rejected_y, &config).unwrap(), None);

    let loose = RemovalConfig {
        location_tolerance: 3.0,
    };
    assert!(plan_removal(&doc, &rejected, &loose).unwrap().is_some());
}

#[test]
fn location_match_compares_trimmed_content() {
    let mut doc = FakeDocument::with_pages(1);
    doc.add_text(0, 10.0, 10.0, "  Draft \n");

    let request = RemovalRequest::new(text_target(10.0, 10.0, "Draft"), 0);
    let outcome = remove_object(&mut doc, &request, &RemovalConfig::default()).unwrap();
    assert_eq!(outcome.count(), 1);
}

#[test]
fn repeated_removal_reports_no_match_without_mutating() {
    let mut doc = confidential_document();
    let request = RemovalRequest::new(text_target(10.0, 10.0, "CONFIDENTIAL"), 0)
        .with_text_method(TextMatchMethod::ByContentOnly);
    let config = RemovalConfig::default();

    remove_object(&mut doc, &request, &config).unwrap();
    let calls_after_first = doc.calls.len();

    assert_eq!(remove_object(&mut doc, &request, &config).unwrap(), RemovalOutcome::NoMatch);
    assert_eq!(remove_object(&mut doc, &request, &config).unwrap(), RemovalOutcome::NoMatch);
    assert_eq!(doc.calls.len(), calls_after_first);
    assert!(doc.pending.is_empty());
}

#[test]
fn only_pages_with_matches_are_committed() {
    let mut doc = confidential_document();
    let request = RemovalRequest::new(text_target(400.0, 400.0, "CONFIDENTIAL"), 2);

    remove_object(&mut doc, &request, &RemovalConfig::default()).unwrap();

    assert_eq!(doc.calls, vec!["redact 2", "apply 2"]);
}

#[test]
fn failed_commit_keeps_earlier_pages() {
    let mut doc = confidential_document();
    doc.fail_apply_on = Some(1);
    let request = RemovalRequest::new(text_target(10.0, 10.0, "CONFIDENTIAL"), 0)
        .with_text_method(TextMatchMethod::ByContentOnly);

    let err = remove_object(&mut doc, &request, &RemovalConfig::default()).unwrap_err();

    assert!(matches!(err, SweepError::Mutation(_)));
    assert_eq!(doc.texts(0), vec!["Body text"]);
    assert_eq!(doc.texts(1), vec!["CONFIDENTIAL", "Body text"]);
    assert_eq!(doc.texts(2), vec!["CONFIDENTIAL", "Body text"]);
}

// ---------------------------------------------------------------------------
// Eligibility and confirmation
// ---------------------------------------------------------------------------

#[test]
fn vectors_are_rejected() {
    let mut doc = FakeDocument::with_pages(1);
    let target = PageObject::Vector {
        bbox: Rect::new(0.0, 0.0, 10.0, 10.0),
        path_kind: PathKind::Stroke,
    };

    let err = remove_object(&mut doc, &RemovalRequest::new(target, 0), &RemovalConfig::default())
        .unwrap_err();

    assert!(matches!(err, SweepError::UnsupportedRemoval(ObjectKind::Vector)));
    assert!(doc.calls.is_empty());
}

#[test]
fn declined_request_touches_nothing() {
    let mut doc = FakeDocument::with_pages(2);
    doc.add_image(0, 7);
    let request =
        RemovalRequest::new(image_target(7), 0).with_confirmation(Confirmation::from(false));

    let outcome = remove_object(&mut doc, &request, &RemovalConfig::default()).unwrap();

    assert_eq!(outcome, RemovalOutcome::Declined);
    assert!(doc.calls.is_empty());
    assert_eq!(doc.pages[0].images.len(), 1);
}

#[test]
fn request_page_must_exist() {
    let mut doc = FakeDocument::with_pages(1);
    let request = RemovalRequest::new(image_target(7), 4);
    let err = remove_object(&mut doc, &request, &RemovalConfig::default()).unwrap_err();
    assert!(matches!(err, SweepError::PageOutOfRange { index: 4, count: 1 }));
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[test]
fn catalog_orders_images_vectors_text() {
    let mut doc = FakeDocument::with_pages(1);
    doc.add_text(0, 10.0, 10.0, "  Heading\n");
    doc.pages[0].blocks.push(TextBlock {
        bbox: Rect::new(50.0, 50.0, 150.0, 150.0),
        content: String::new(),
        kind: BlockKind::Image,
    });
    doc.add_text(0, 10.0, 40.0, "   ");
    doc.pages[0].drawings.push(DrawingInfo {
        bbox: Rect::new(0.0, 0.0, 600.0, 1.0),
        kind: PathKind::Stroke,
    });
    doc.add_image(0, 5);

    let catalog = build_catalog(&doc, 0).unwrap();

    let kinds: Vec<ObjectKind> = catalog.iter().map(PageObject::kind).collect();
    assert_eq!(kinds, vec![ObjectKind::Image, ObjectKind::Vector, ObjectKind::Text]);
    assert!(matches!(&catalog[2], PageObject::Text { content, .. } if content == "Heading"));
    assert_eq!(build_catalog(&doc, 0).unwrap(), catalog);
}
