// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: page geometry, catalog entries, and removal requests.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page space.
///
/// The origin is the top-left corner of the page's MediaBox and `y` grows
/// downward, so `(x0, y0)` is always the visual top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Build a rectangle from two corners, normalising the order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// The zero rectangle, used for objects that are referenced but never placed.
    pub const fn empty() -> Self {
        Self {
            x0: 0.0,
            y0: 0.0,
            x1: 0.0,
            y1: 0.0,
        }
    }

    /// Smallest rectangle containing every point in `points`.
    pub fn from_points(points: impl IntoIterator<Item = (f32, f32)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (x, y) = iter.next()?;
        let mut rect = Self {
            x0: x,
            y0: y,
            x1: x,
            y1: y,
        };
        for (x, y) in iter {
            rect.x0 = rect.x0.min(x);
            rect.y0 = rect.y0.min(y);
            rect.x1 = rect.x1.max(x);
            rect.y1 = rect.y1.max(y);
        }
        Some(rect)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// True when the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn top_left(&self) -> (f32, f32) {
        (self.x0, self.y0)
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Whether the two rectangles share any interior area.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Point containment, edges inclusive.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// Multiply every coordinate by `factor` (page space to pixel space).
    pub fn scale(&self, factor: f32) -> Rect {
        Rect {
            x0: self.x0 * factor,
            y0: self.y0 * factor,
            x1: self.x1 * factor,
            y1: self.y1 * factor,
        }
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.1}, {:.1})-({:.1}, {:.1})",
            self.x0, self.y0, self.x1, self.y1
        )
    }
}

/// Document-wide identity of an embedded resource (PDF indirect object id).
///
/// Every placement of the same embedded image, on any page, shares one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    pub number: u32,
    pub generation: u16,
}

impl ResourceId {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }
}

impl From<(u32, u16)> for ResourceId {
    fn from((number, generation): (u32, u16)) -> Self {
        Self { number, generation }
    }
}

impl From<ResourceId> for (u32, u16) {
    fn from(id: ResourceId) -> Self {
        (id.number, id.generation)
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number)
    }
}

/// The three kinds of object the catalog lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Image,
    Vector,
    Text,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Image => "image",
            Self::Vector => "vector",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

/// How a vector path is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathKind {
    Fill,
    Stroke,
    FillStroke,
}

impl PathKind {
    /// Short label shown in the object listing.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fill => "f",
            Self::Stroke => "s",
            Self::FillStroke => "fs",
        }
    }
}

/// A single entry in a page's object catalog.
///
/// Catalog entries only live for one render cycle: their position in the
/// catalog is meaningless once the page is re-rendered or changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PageObject {
    Image {
        bbox: Rect,
        resource: ResourceId,
        width_px: u32,
        height_px: u32,
    },
    Vector {
        bbox: Rect,
        path_kind: PathKind,
    },
    Text {
        bbox: Rect,
        /// Exact trimmed block text.
        content: String,
    },
}

impl PageObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Image { .. } => ObjectKind::Image,
            Self::Vector { .. } => ObjectKind::Vector,
            Self::Text { .. } => ObjectKind::Text,
        }
    }

    pub fn bbox(&self) -> Rect {
        match self {
            Self::Image { bbox, .. } | Self::Vector { bbox, .. } | Self::Text { bbox, .. } => *bbox,
        }
    }

    /// What removal matches on: the image resource or the text content.
    /// Vectors have none.
    pub fn identity(&self) -> Option<ObjectIdentity<'_>> {
        match self {
            Self::Image { resource, .. } => Some(ObjectIdentity::Resource(*resource)),
            Self::Text { content, .. } => Some(ObjectIdentity::Content(content)),
            Self::Vector { .. } => None,
        }
    }

    /// Whether the removal engine accepts this object.
    pub fn is_removable(&self) -> bool {
        self.identity().is_some()
    }
}

/// The matching key of a removable catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectIdentity<'a> {
    Resource(ResourceId),
    Content(&'a str),
}

/// Which pages a removal touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RemovalScope {
    CurrentPageOnly,
    #[default]
    AllPages,
}

/// How text matches are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextMatchMethod {
    /// Same trimmed block text, with the top-left corner near the target's.
    #[default]
    ByLocationAndContent,
    /// Every exact occurrence of the text, wherever it sits.
    ByContentOnly,
}

/// The user's answer to the confirmation prompt, resolved before the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confirmation {
    Approved,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(approved: bool) -> Self {
        if approved {
            Self::Approved
        } else {
            Self::Declined
        }
    }
}

/// A user's request to remove one catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalRequest {
    pub target: PageObject,
    /// 0-based index of the page the target was listed on.
    pub page: usize,
    pub scope: RemovalScope,
    /// Ignored for images.
    pub text_method: TextMatchMethod,
    pub confirmation: Confirmation,
}

impl RemovalRequest {
    /// An approved request with default scope and method.
    pub fn new(target: PageObject, page: usize) -> Self {
        Self {
            target,
            page,
            scope: RemovalScope::default(),
            text_method: TextMatchMethod::default(),
            confirmation: Confirmation::Approved,
        }
    }

    pub fn with_scope(mut self, scope: RemovalScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_text_method(mut self, method: TextMatchMethod) -> Self {
        self.text_method = method;
        self
    }

    pub fn with_confirmation(mut self, confirmation: Confirmation) -> Self {
        self.confirmation = confirmation;
        self
    }
}

/// Result of a removal that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalOutcome {
    /// `count` instances were detached or redacted (always at least one).
    Removed { count: usize },
    /// Nothing matched; the document was not touched.
    NoMatch,
    /// The user declined the confirmation; nothing was evaluated.
    Declined,
}

impl RemovalOutcome {
    pub fn count(&self) -> usize {
        match self {
            Self::Removed { count } => *count,
            Self::NoMatch | Self::Declined => 0,
        }
    }
}

/// Whether a redaction pass may also strip images under the redacted area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageRedaction {
    /// Leave images alone.
    #[default]
    None,
    /// Remove image placements that overlap a redaction.
    Remove,
}

/// Compaction applied when writing a modified document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOptions {
    /// Drop objects no longer reachable from the trailer.
    pub prune_unused: bool,
    /// Renumber objects densely after pruning.
    pub renumber: bool,
    /// Flate-compress uncompressed streams.
    pub compress: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            prune_unused: true,
            renumber: true,
            compress: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_new_normalises_corners() {
        let r = Rect::new(100.0, 20.0, 10.0, 10.0);
        assert_eq!(r, Rect { x0: 10.0, y0: 10.0, x1: 100.0, y1: 20.0 });
        assert_eq!(r.width(), 90.0);
        assert_eq!(r.height(), 10.0);
    }

    #[test]
    fn rect_from_points_covers_all() {
        let r = Rect::from_points([(5.0, 8.0), (1.0, 9.0), (3.0, 2.0)]).unwrap();
        assert_eq!(r, Rect::new(1.0, 2.0, 5.0, 9.0));
        assert!(Rect::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn rect_intersection_excludes_touching_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!a.intersects(&Rect::new(10.0, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn empty_rect_has_no_area() {
        assert!(Rect::empty().is_empty());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn vectors_are_not_removable() {
        let vector = PageObject::Vector {
            bbox: Rect::empty(),
            path_kind: PathKind::Stroke,
        };
        let text = PageObject::Text {
            bbox: Rect::empty(),
            content: "x".into(),
        };
        assert!(!vector.is_removable());
        assert!(text.is_removable());
        assert_eq!(text.identity(), Some(ObjectIdentity::Content("x")));
        assert_eq!(vector.identity(), None);
        assert_eq!(vector.kind(), ObjectKind::Vector);
    }

    #[test]
    fn outcome_count() {
        assert_eq!(RemovalOutcome::Removed { count: 3 }.count(), 3);
        assert_eq!(RemovalOutcome::NoMatch.count(), 0);
        assert_eq!(RemovalOutcome::Declined.count(), 0);
    }

    #[test]
    fn resource_id_displays_object_number() {
        assert_eq!(ResourceId::new(7, 0).to_string(), "7");
    }
}
