// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Removal policy engine — decides which pages and regions a removal request
// touches, then drives the document editor to detach or redact them.
//
// Matching (`plan_removal`) only reads the document. Mutation
// (`execute_plan`) runs page by page; a failure part way leaves the pages
// already changed as they are.

use pdfsweep_core::config::AppConfig;
use pdfsweep_core::error::{Result, SweepError};
use pdfsweep_core::types::{
    Confirmation, ImageRedaction, PageObject, Rect, RemovalOutcome, RemovalRequest, RemovalScope,
    ResourceId, TextMatchMethod,
};
use tracing::{debug, info, instrument, warn};

use crate::access::{BlockKind, DocumentAccess, DocumentEditor};
use crate::catalog::snippet;

/// Tuning for the matching rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemovalConfig {
    /// Largest top-left drift, per axis and inclusive, at which a text block
    /// still counts as "the same place" as the target.
    pub location_tolerance: f32,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            location_tolerance: 2.0,
        }
    }
}

impl From<&AppConfig> for RemovalConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            location_tolerance: config.location_tolerance,
        }
    }
}

/// Redaction areas for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRedactions {
    pub page: usize,
    pub areas: Vec<Rect>,
}

/// The mutations a request resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum RemovalPlan {
    /// Detach `resource` from each of `pages`, in order.
    DetachImage {
        resource: ResourceId,
        pages: Vec<usize>,
    },
    /// Redact the listed areas; `matches` is the count reported to the user.
    Redact {
        pages: Vec<PageRedactions>,
        matches: usize,
    },
}

/// Pages a removal visits, in document order.
pub fn pages_in_scope(page_count: usize, current: usize, scope: RemovalScope) -> Result<Vec<usize>> {
    if current >= page_count {
        return Err(SweepError::PageOutOfRange {
            index: current,
            count: page_count,
        });
    }
    Ok(match scope {
        RemovalScope::CurrentPageOnly => vec![current],
        RemovalScope::AllPages => (0..page_count).collect(),
    })
}

/// Whether `candidate`'s top-left corner lies within `tolerance` of
/// `target`'s, independently in x and y.
pub fn within_tolerance(candidate: &Rect, target: &Rect, tolerance: f32) -> bool {
    (candidate.x0 - target.x0).abs() <= tolerance && (candidate.y0 - target.y0).abs() <= tolerance
}

/// Work out what `request` would change, without changing anything.
///
/// Returns `None` when nothing in scope matches.
#[instrument(skip_all, fields(page = request.page, scope = ?request.scope))]
pub fn plan_removal<D>(doc: &D, request: &RemovalRequest, config: &RemovalConfig) -> Result<Option<RemovalPlan>>
where
    D: DocumentAccess + ?Sized,
{
    let pages = pages_in_scope(doc.page_count(), request.page, request.scope)?;

    let plan = match &request.target {
        PageObject::Image { resource, .. } => {
            let mut holders = Vec::new();
            for page in pages {
                if doc.images(page)?.iter().any(|image| image.resource == *resource) {
                    holders.push(page);
                }
            }
            (!holders.is_empty()).then(|| RemovalPlan::DetachImage {
                resource: *resource,
                pages: holders,
            })
        }
        PageObject::Text { bbox, content } => {
            let (redactions, matches) = match request.text_method {
                TextMatchMethod::ByLocationAndContent => {
                    match_by_location(doc, &pages, bbox, content, config.location_tolerance)?
                }
                TextMatchMethod::ByContentOnly => match_by_content(doc, &pages, content)?,
            };
            (matches > 0).then_some(RemovalPlan::Redact {
                pages: redactions,
                matches,
            })
        }
        PageObject::Vector { .. } => {
            return Err(SweepError::UnsupportedRemoval(request.target.kind()));
        }
    };

    debug!(matched = plan.is_some(), "Removal planned");
    Ok(plan)
}

fn match_by_location<D>(
    doc: &D,
    pages: &[usize],
    target: &Rect,
    content: &str,
    tolerance: f32,
) -> Result<(Vec<PageRedactions>, usize)>
where
    D: DocumentAccess + ?Sized,
{
    let content = content.trim();
    let mut redactions = Vec::new();
    let mut matches = 0;
    for &page in pages {
        let areas: Vec<Rect> = doc
            .text_blocks(page)?
            .into_iter()
            .filter(|block| block.kind == BlockKind::Text && block.content.trim() == content)
            .filter(|block| within_tolerance(&block.bbox, target, tolerance))
            .map(|block| block.bbox)
            .collect();
        if !areas.is_empty() {
            matches += areas.len();
            redactions.push(PageRedactions { page, areas });
        }
    }
    Ok((redactions, matches))
}

fn match_by_content<D>(doc: &D, pages: &[usize], content: &str) -> Result<(Vec<PageRedactions>, usize)>
where
    D: DocumentAccess + ?Sized,
{
    let mut redactions = Vec::new();
    let mut matches = 0;
    for &page in pages {
        let hits = doc.search_text(page, content)?;
        if hits.is_empty() {
            continue;
        }
        matches += hits.len();
        let areas = hits.into_iter().flat_map(|hit| hit.rects).collect();
        redactions.push(PageRedactions { page, areas });
    }
    Ok((redactions, matches))
}

/// Apply a plan to the document.
///
/// Text redactions are queued on every page first, then committed page by
/// page with images left alone.
#[instrument(skip_all)]
pub fn execute_plan<D>(doc: &mut D, plan: &RemovalPlan) -> Result<RemovalOutcome>
where
    D: DocumentEditor + ?Sized,
{
    let count = match plan {
        RemovalPlan::DetachImage { resource, pages } => {
            let mut detached = 0;
            for &page in pages {
                if doc.detach_image(page, *resource).map_err(into_mutation)? {
                    detached += 1;
                }
            }
            detached
        }
        RemovalPlan::Redact { pages, matches } => {
            for redactions in pages {
                for area in &redactions.areas {
                    doc.add_redaction(redactions.page, *area).map_err(into_mutation)?;
                }
            }
            for redactions in pages {
                doc.apply_redactions(redactions.page, ImageRedaction::None)
                    .map_err(into_mutation)?;
            }
            *matches
        }
    };

    if count == 0 {
        warn!("Plan executed but nothing was removed");
        return Ok(RemovalOutcome::NoMatch);
    }
    Ok(RemovalOutcome::Removed { count })
}

fn into_mutation(err: SweepError) -> SweepError {
    match err {
        SweepError::Mutation(_) => err,
        other => SweepError::Mutation(other.to_string()),
    }
}

/// Carry out a removal request end to end.
///
/// Vectors are rejected with [`SweepError::UnsupportedRemoval`]; a declined
/// request returns [`RemovalOutcome::Declined`] without reading the document;
/// a request with no matches returns [`RemovalOutcome::NoMatch`] without
/// modifying it.
#[instrument(skip_all, fields(kind = %request.target.kind(), page = request.page))]
pub fn remove_object<D>(doc: &mut D, request: &RemovalRequest, config: &RemovalConfig) -> Result<RemovalOutcome>
where
    D: DocumentEditor + ?Sized,
{
    if !request.target.is_removable() {
        return Err(SweepError::UnsupportedRemoval(request.target.kind()));
    }
    if request.confirmation == Confirmation::Declined {
        debug!("Removal declined");
        return Ok(RemovalOutcome::Declined);
    }

    let Some(plan) = plan_removal(&*doc, request, config)? else {
        info!("No matching objects");
        return Ok(RemovalOutcome::NoMatch);
    };
    let outcome = execute_plan(doc, &plan)?;
    info!(count = outcome.count(), "Removal complete");
    Ok(outcome)
}

/// Title and message of the confirmation prompt for a removal.
pub fn confirmation_prompt(
    target: &PageObject,
    scope: RemovalScope,
    method: TextMatchMethod,
) -> Option<(String, String)> {
    let reach = match scope {
        RemovalScope::AllPages => "from all pages",
        RemovalScope::CurrentPageOnly => "from this page",
    };
    match target {
        PageObject::Image { resource, .. } => Some((
            "Confirm Image Deletion".to_string(),
            format!("Remove all instances of Image ID {resource} {reach}?"),
        )),
        PageObject::Text { content, .. } => Some(match method {
            TextMatchMethod::ByLocationAndContent => (
                "Confirm Text Removal by Location".to_string(),
                format!(
                    "Permanently REMOVE text matching:\n\nContent: \"{}\"\nLocation: Near this area\n\n{reach}?",
                    snippet(content, 30)
                ),
            ),
            TextMatchMethod::ByContentOnly => (
                "Confirm Text Removal by Content".to_string(),
                format!(
                    "Permanently REMOVE all occurrences of the text \"{}\" {reach}, regardless of location?",
                    snippet(content, 40)
                ),
            ),
        }),
        PageObject::Vector { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfsweep_core::types::PathKind;

    #[test]
    fn scope_lists_pages_in_order() {
        assert_eq!(pages_in_scope(3, 1, RemovalScope::AllPages).unwrap(), vec![0, 1, 2]);
        assert_eq!(pages_in_scope(3, 1, RemovalScope::CurrentPageOnly).unwrap(), vec![1]);
    }

    #[test]
    fn scope_rejects_missing_current_page() {
        let err = pages_in_scope(2, 5, RemovalScope::AllPages).unwrap_err();
        assert!(matches!(err, SweepError::PageOutOfRange { index: 5, count: 2 }));
    }

    #[test]
    fn tolerance_is_inclusive_per_axis() {
        let target = Rect::new(10.0, 10.0, 100.0, 20.0);
        assert!(within_tolerance(&Rect::new(12.0, 8.0, 90.0, 18.0), &target, 2.0));
        assert!(!within_tolerance(&Rect::new(12.5, 10.0, 90.0, 20.0), &target, 2.0));
        assert!(!within_tolerance(&Rect::new(10.0, 7.9, 90.0, 20.0), &target, 2.0));
    }

    #[test]
    fn config_follows_app_settings() {
        let app = AppConfig {
            location_tolerance: 4.5,
            ..AppConfig::default()
        };
        assert_eq!(RemovalConfig::from(&app).location_tolerance, 4.5);
        assert_eq!(RemovalConfig::default().location_tolerance, 2.0);
    }

    #[test]
    fn prompts_name_the_target() {
        let image = PageObject::Image {
            bbox: Rect::empty(),
            resource: ResourceId::new(7, 0),
            width_px: 1,
            height_px: 1,
        };
        let (title, message) =
            confirmation_prompt(&image, RemovalScope::AllPages, TextMatchMethod::default()).unwrap();
        assert_eq!(title, "Confirm Image Deletion");
        assert!(message.contains("Image ID 7 from all pages"));

        let vector = PageObject::Vector {
            bbox: Rect::empty(),
            path_kind: PathKind::Fill,
        };
        assert!(confirmation_prompt(&vector, RemovalScope::AllPages, TextMatchMethod::default()).is_none());
    }
}
