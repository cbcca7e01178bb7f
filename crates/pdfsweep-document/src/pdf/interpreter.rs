// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content stream interpreter — walks a page's operators and records where
// every glyph, image placement, and painted path lands in page space.
//
// The result (`PageLayout`) keeps the decoded operation list alongside the
// positions so the redaction pass can rewrite exactly the operators whose
// glyphs it removes. Form XObjects are interpreted in place, each painting
// recorded as a `FormInstance` with its own operation list.

use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdfsweep_core::error::SweepError;
use pdfsweep_core::types::{PathKind, Rect};
use tracing::{debug, instrument, trace};

use super::fonts::FontMetrics;
use super::objects::{
    decode_stream, media_box, number, page_content_bytes, page_resources, resolve, resolve_dict,
    resource_category,
};
use crate::access::{BlockKind, DrawingInfo, TextBlock, TextHit};

/// Glyph box extents relative to the baseline, in text space units.
const GLYPH_DESCENT: f32 = -0.2;
const GLYPH_ASCENT: f32 = 0.8;

/// Horizontal gap, as a fraction of glyph height, read as a word break.
const WORD_GAP_RATIO: f32 = 0.25;

/// Forms nested deeper than this are not descended into.
const MAX_FORM_DEPTH: usize = 8;

/// 2D affine transform in PDF row-vector form `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub(crate) const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub(crate) fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub(crate) fn translate(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`.
    pub(crate) fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub(crate) fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Read a six-number array such as a form's `/Matrix`.
    fn from_array(values: &[Object]) -> Option<Matrix> {
        let numbers: Vec<f32> = values.iter().map(number).collect::<Option<_>>()?;
        match numbers[..] {
            [a, b, c, d, e, f] => Some(Matrix::new(a, b, c, d, e, f)),
            _ => None,
        }
    }
}

/// Converts PDF user space (origin bottom-left) to top-left page space.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageSpace {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl PageSpace {
    pub(crate) fn from_media_box(media_box: [f32; 4]) -> Self {
        Self {
            llx: media_box[0],
            lly: media_box[1],
            urx: media_box[2],
            ury: media_box[3],
        }
    }

    pub(crate) fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub(crate) fn height(&self) -> f32 {
        self.ury - self.lly
    }

    pub(crate) fn to_page(&self, x: f32, y: f32) -> (f32, f32) {
        (x - self.llx, self.ury - y)
    }

    /// Inverse of [`PageSpace::to_page`] for a whole rectangle: returns
    /// `(x, y, width, height)` in user space, as the `re` operator expects.
    pub(crate) fn to_user_rect(&self, rect: &Rect) -> (f32, f32, f32, f32) {
        (
            rect.x0 + self.llx,
            self.ury - rect.y1,
            rect.width(),
            rect.height(),
        )
    }

    fn transform_box(&self, matrix: &Matrix, corners: [(f32, f32); 4]) -> Rect {
        let points = corners.map(|(x, y)| {
            let (ux, uy) = matrix.apply(x, y);
            self.to_page(ux, uy)
        });
        Rect::from_points(points).unwrap_or_else(Rect::empty)
    }
}

/// One shown glyph and where it came from in the content stream.
#[derive(Debug, Clone)]
pub(crate) struct PlacedGlyph {
    pub text: String,
    pub bbox: Rect,
    /// Stream holding the showing operator: `None` for the page content,
    /// otherwise an index into `PageLayout::forms`.
    pub stream: Option<usize>,
    /// Index of the showing operator within that stream.
    pub op_index: usize,
    /// Element of the TJ array (0 for Tj, ' and ").
    pub element: usize,
    /// Byte range of the glyph's code within that string.
    pub bytes: Range<usize>,
    /// TJ adjustment that advances exactly as far as this glyph does.
    pub gap: f32,
    baseline: (f32, f32),
}

/// An image XObject painted with `Do`.
#[derive(Debug, Clone)]
pub(crate) struct ImagePlacement {
    pub name: Vec<u8>,
    pub id: Option<ObjectId>,
    pub bbox: Rect,
    pub stream: Option<usize>,
    pub op_index: usize,
}

/// One painting of a form XObject and the operators it ran.
#[derive(Debug, Clone)]
pub(crate) struct FormInstance {
    /// Resource name the `Do` used.
    pub name: Vec<u8>,
    /// Stream holding the `Do`: `None` for the page content.
    pub parent: Option<usize>,
    /// Index of the `Do` within the parent stream.
    pub op_index: usize,
    /// The form's stream dictionary.
    pub dict: Dictionary,
    /// Resources the form's operators were interpreted against.
    pub resources: Dictionary,
    pub operations: Vec<Operation>,
}

/// Content blocks in stream order.
#[derive(Debug, Clone, Copy)]
enum BlockSource {
    Text(usize),
    Image(usize),
}

/// Everything the interpreter learned about one page.
#[derive(Debug, Clone)]
pub(crate) struct PageLayout {
    pub space: PageSpace,
    pub operations: Vec<Operation>,
    /// Form XObject paintings, parents before the forms they paint.
    pub forms: Vec<FormInstance>,
    pub glyphs: Vec<PlacedGlyph>,
    pub images: Vec<ImagePlacement>,
    pub drawings: Vec<DrawingInfo>,
    /// Glyph indices per line, per BT…ET text object.
    text_objects: Vec<Vec<Vec<usize>>>,
    order: Vec<BlockSource>,
}

/// A character of the searchable page text.
#[derive(Debug, Clone, Copy)]
struct SearchChar {
    ch: char,
    rect: Option<Rect>,
    line: usize,
}

impl PageLayout {
    /// Operators of the page content (`None`) or of form painting `stream`.
    pub(crate) fn stream_operations(&self, stream: Option<usize>) -> Option<&[Operation]> {
        match stream {
            None => Some(&self.operations),
            Some(index) => self.forms.get(index).map(|form| form.operations.as_slice()),
        }
    }

    /// First placement of the image object `id`, if it is painted at all.
    pub(crate) fn image_bbox(&self, id: ObjectId) -> Option<Rect> {
        self.images
            .iter()
            .find(|placement| placement.id == Some(id))
            .map(|placement| placement.bbox)
    }

    /// Characters of one line, with a space inserted at visible word gaps.
    fn line_chars(&self, line: &[usize]) -> Vec<(char, Rect)> {
        let mut chars: Vec<(char, Rect)> = Vec::new();
        let mut previous: Option<&PlacedGlyph> = None;
        for &index in line {
            let glyph = &self.glyphs[index];
            if let Some(prev) = previous {
                let gap = glyph.bbox.x0 - prev.bbox.x1;
                let threshold = glyph.bbox.height().max(prev.bbox.height()) * WORD_GAP_RATIO;
                let prev_space = prev.text.ends_with(char::is_whitespace);
                let next_space = glyph.text.starts_with(char::is_whitespace);
                if gap > threshold && !prev_space && !next_space {
                    let rect = Rect::new(prev.bbox.x1, prev.bbox.y0, glyph.bbox.x0, prev.bbox.y1);
                    chars.push((' ', rect));
                }
            }
            for ch in glyph.text.chars() {
                chars.push((ch, glyph.bbox));
            }
            previous = Some(glyph);
        }
        chars
    }

    /// Text and image blocks in content order.
    pub(crate) fn text_blocks(&self) -> Vec<TextBlock> {
        let mut blocks = Vec::new();
        for source in &self.order {
            match *source {
                BlockSource::Text(index) => {
                    let lines = &self.text_objects[index];
                    let mut bbox: Option<Rect> = None;
                    let mut content_lines = Vec::with_capacity(lines.len());
                    for line in lines {
                        let chars = self.line_chars(line);
                        for (_, rect) in &chars {
                            bbox = Some(bbox.map_or(*rect, |b| b.union(rect)));
                        }
                        content_lines.push(chars.into_iter().map(|(ch, _)| ch).collect::<String>());
                    }
                    if let Some(bbox) = bbox {
                        blocks.push(TextBlock {
                            bbox,
                            content: content_lines.join("\n"),
                            kind: BlockKind::Text,
                        });
                    }
                }
                BlockSource::Image(index) => {
                    let placement = &self.images[index];
                    blocks.push(TextBlock {
                        bbox: placement.bbox,
                        content: String::new(),
                        kind: BlockKind::Image,
                    });
                }
            }
        }
        blocks
    }

    /// Page text as searched: lines joined with `\n`, blocks likewise.
    fn search_chars(&self) -> Vec<SearchChar> {
        let mut out = Vec::new();
        let mut line_no = 0;
        for source in &self.order {
            let BlockSource::Text(index) = *source else {
                continue;
            };
            for line in &self.text_objects[index] {
                let chars = self.line_chars(line);
                if chars.is_empty() {
                    continue;
                }
                if !out.is_empty() {
                    out.push(SearchChar {
                        ch: '\n',
                        rect: None,
                        line: line_no,
                    });
                }
                line_no += 1;
                out.extend(chars.into_iter().map(|(ch, rect)| SearchChar {
                    ch,
                    rect: Some(rect),
                    line: line_no,
                }));
            }
        }
        out
    }

    /// Every exact, non-overlapping occurrence of `needle`.
    pub(crate) fn search(&self, needle: &str) -> Vec<TextHit> {
        let needle: Vec<char> = needle.chars().collect();
        if needle.is_empty() {
            return Vec::new();
        }
        let haystack = self.search_chars();
        let mut hits = Vec::new();
        let mut i = 0;
        while i + needle.len() <= haystack.len() {
            let window = &haystack[i..i + needle.len()];
            if window.iter().zip(&needle).all(|(c, n)| c.ch == *n) {
                let mut rects: Vec<(usize, Rect)> = Vec::new();
                for c in window {
                    let Some(rect) = c.rect else {
                        continue;
                    };
                    match rects.last_mut() {
                        Some((line, acc)) if *line == c.line => *acc = acc.union(&rect),
                        _ => rects.push((c.line, rect)),
                    }
                }
                if !rects.is_empty() {
                    hits.push(TextHit {
                        rects: rects.into_iter().map(|(_, rect)| rect).collect(),
                    });
                }
                i += needle.len();
            } else {
                i += 1;
            }
        }
        hits
    }
}

/// Graphics and text state saved by `q` and restored by `Q`.
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    font: Option<Vec<u8>>,
    font_size: f32,
    rise: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            font: None,
            font_size: 0.0,
            rise: 0.0,
        }
    }
}

/// Interpreter state that belongs to one content stream and is swapped out
/// while a form runs.
struct StreamScope {
    resources: Dictionary,
    font_resources: Dictionary,
    xobjects: Dictionary,
    fonts: HashMap<Vec<u8>, Rc<FontMetrics>>,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    path: Vec<(f32, f32)>,
    in_text: bool,
    stream: Option<usize>,
}

struct Interpreter<'a> {
    doc: &'a Document,
    space: PageSpace,
    resources: Dictionary,
    font_resources: Dictionary,
    xobjects: Dictionary,
    fonts: HashMap<Vec<u8>, Rc<FontMetrics>>,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    path: Vec<(f32, f32)>,
    glyphs: Vec<PlacedGlyph>,
    images: Vec<ImagePlacement>,
    drawings: Vec<DrawingInfo>,
    text_objects: Vec<Vec<Vec<usize>>>,
    order: Vec<BlockSource>,
    in_text: bool,
    forms: Vec<FormInstance>,
    /// Stream currently executing.
    stream: Option<usize>,
    form_depth: usize,
}

fn operand(op: &Operation, index: usize) -> f32 {
    op.operands.get(index).and_then(number).unwrap_or(0.0)
}

impl<'a> Interpreter<'a> {
    fn new(doc: &'a Document, space: PageSpace, resources: &Dictionary) -> Self {
        Self {
            doc,
            space,
            resources: resources.clone(),
            font_resources: resource_category(doc, resources, b"Font"),
            xobjects: resource_category(doc, resources, b"XObject"),
            fonts: HashMap::new(),
            state: GraphicsState::default(),
            stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            path: Vec::new(),
            glyphs: Vec::new(),
            images: Vec::new(),
            drawings: Vec::new(),
            text_objects: Vec::new(),
            order: Vec::new(),
            in_text: false,
            forms: Vec::new(),
            stream: None,
            form_depth: 0,
        }
    }

    fn font_metrics(&mut self) -> Rc<FontMetrics> {
        let Some(name) = self.state.font.clone() else {
            return Rc::new(FontMetrics::default());
        };
        if let Some(metrics) = self.fonts.get(&name) {
            return Rc::clone(metrics);
        }
        let metrics = self
            .font_resources
            .get(&name)
            .ok()
            .and_then(|object| resolve_dict(self.doc, object).ok())
            .map(|dict| FontMetrics::load(self.doc, dict))
            .unwrap_or_default();
        let metrics = Rc::new(metrics);
        self.fonts.insert(name, Rc::clone(&metrics));
        metrics
    }

    fn begin_text(&mut self) {
        self.in_text = true;
        self.text_matrix = Matrix::IDENTITY;
        self.line_matrix = Matrix::IDENTITY;
        self.order.push(BlockSource::Text(self.text_objects.len()));
        self.text_objects.push(Vec::new());
    }

    fn move_text(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translate(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.leading;
        self.move_text(0.0, -leading);
    }

    fn place_on_line(&mut self, glyph_index: usize) {
        if !self.in_text || self.text_objects.is_empty() {
            self.begin_text();
        }
        let glyph = &self.glyphs[glyph_index];
        let (x, y) = glyph.baseline;
        let height = glyph.bbox.height().max(1.0);
        let Some(lines) = self.text_objects.last_mut() else {
            return;
        };

        let same_line = lines
            .last()
            .and_then(|line| line.last())
            .map(|&prev_index| {
                let prev = &self.glyphs[prev_index];
                (prev.baseline.1 - y).abs() <= height * 0.5 && x >= prev.bbox.x0 - height
            })
            .unwrap_or(false);

        match lines.last_mut() {
            Some(line) if same_line => line.push(glyph_index),
            _ => lines.push(vec![glyph_index]),
        }
    }

    fn show_string(&mut self, op_index: usize, element: usize, bytes: &[u8]) {
        let metrics = self.font_metrics();
        let font_size = self.state.font_size;
        let scale = self.state.horizontal_scale;
        let rendering = Matrix::new(font_size * scale, 0.0, 0.0, font_size, 0.0, self.state.rise);

        for (code, range) in metrics.codes(bytes) {
            let w0 = metrics.width(code) / 1000.0;
            let trm = rendering.multiply(&self.text_matrix).multiply(&self.state.ctm);
            let bbox = self.space.transform_box(
                &trm,
                [
                    (0.0, GLYPH_DESCENT),
                    (w0, GLYPH_DESCENT),
                    (0.0, GLYPH_ASCENT),
                    (w0, GLYPH_ASCENT),
                ],
            );
            let (bx, by) = trm.apply(0.0, 0.0);
            let baseline = self.space.to_page(bx, by);

            let word_spacing = if !metrics.is_two_byte() && code == 32 {
                self.state.word_spacing
            } else {
                0.0
            };
            let advance = w0 * font_size + self.state.char_spacing + word_spacing;
            let gap = if font_size != 0.0 {
                -advance * 1000.0 / font_size
            } else {
                0.0
            };

            self.glyphs.push(PlacedGlyph {
                text: metrics.decode(code),
                bbox,
                stream: self.stream,
                op_index,
                element,
                bytes: range,
                gap,
                baseline,
            });
            self.place_on_line(self.glyphs.len() - 1);

            self.text_matrix = Matrix::translate(advance * scale, 0.0).multiply(&self.text_matrix);
        }
    }

    fn adjust(&mut self, amount: f32) {
        let tx = -amount / 1000.0 * self.state.font_size * self.state.horizontal_scale;
        self.text_matrix = Matrix::translate(tx, 0.0).multiply(&self.text_matrix);
    }

    fn add_point(&mut self, x: f32, y: f32) {
        let (ux, uy) = self.state.ctm.apply(x, y);
        let point = self.space.to_page(ux, uy);
        self.path.push(point);
    }

    fn paint(&mut self, kind: Option<PathKind>) {
        let points = std::mem::take(&mut self.path);
        if let (Some(kind), Some(bbox)) = (kind, Rect::from_points(points)) {
            self.drawings.push(DrawingInfo { bbox, kind });
        }
    }

    fn paint_xobject(&mut self, op_index: usize, op: &Operation) {
        let Some(Object::Name(name)) = op.operands.first() else {
            return;
        };
        let Ok(entry) = self.xobjects.get(name) else {
            trace!(name = %String::from_utf8_lossy(name), "Do of unknown XObject");
            return;
        };
        let entry = entry.clone();
        let id = match entry {
            Object::Reference(id) => Some(id),
            _ => None,
        };
        let Ok(Object::Stream(stream)) = resolve(self.doc, &entry) else {
            return;
        };
        match stream.dict.get(b"Subtype").and_then(Object::as_name).unwrap_or_default() {
            b"Image" => {
                let bbox = self.space.transform_box(
                    &self.state.ctm,
                    [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)],
                );
                self.order.push(BlockSource::Image(self.images.len()));
                self.images.push(ImagePlacement {
                    name: name.clone(),
                    id,
                    bbox,
                    stream: self.stream,
                    op_index,
                });
            }
            b"Form" => self.run_form(op_index, name.clone(), stream),
            _ => {}
        }
    }

    /// Run a form XObject's operators under its `/Matrix` and `/Resources`.
    fn run_form(&mut self, op_index: usize, name: Vec<u8>, form: &Stream) {
        let label = String::from_utf8_lossy(&name).into_owned();
        if self.form_depth >= MAX_FORM_DEPTH {
            debug!(form = %label, "form nesting too deep; not descended into");
            return;
        }
        let operations = match decode_stream(form).and_then(|bytes| {
            Content::decode(&bytes)
                .map_err(|err| SweepError::Pdf(format!("cannot parse form content: {}", err)))
        }) {
            Ok(content) => content.operations,
            Err(err) => {
                debug!(form = %label, error = %err, "skipping unreadable form");
                return;
            }
        };
        let resources = form
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|object| resolve_dict(self.doc, object).ok())
            .cloned()
            .unwrap_or_else(|| self.resources.clone());
        let matrix = form
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|object| resolve(self.doc, object).ok())
            .and_then(|object| object.as_array().ok())
            .and_then(|values| Matrix::from_array(values))
            .unwrap_or(Matrix::IDENTITY);

        let index = self.forms.len();
        self.forms.push(FormInstance {
            name,
            parent: self.stream,
            op_index,
            dict: form.dict.clone(),
            resources: resources.clone(),
            operations: Vec::new(),
        });
        trace!(form = %label, index, "entering form");

        let mut state = self.state.clone();
        state.ctm = matrix.multiply(&self.state.ctm);
        let outer = self.swap_scope(StreamScope {
            font_resources: resource_category(self.doc, &resources, b"Font"),
            xobjects: resource_category(self.doc, &resources, b"XObject"),
            resources,
            fonts: HashMap::new(),
            state,
            stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            path: Vec::new(),
            in_text: false,
            stream: Some(index),
        });
        self.form_depth += 1;
        for (i, op) in operations.iter().enumerate() {
            self.execute(i, op);
        }
        self.form_depth -= 1;
        self.swap_scope(outer);
        self.forms[index].operations = operations;
    }

    /// Install `scope` and hand back the one it replaces.
    fn swap_scope(&mut self, scope: StreamScope) -> StreamScope {
        StreamScope {
            resources: std::mem::replace(&mut self.resources, scope.resources),
            font_resources: std::mem::replace(&mut self.font_resources, scope.font_resources),
            xobjects: std::mem::replace(&mut self.xobjects, scope.xobjects),
            fonts: std::mem::replace(&mut self.fonts, scope.fonts),
            state: std::mem::replace(&mut self.state, scope.state),
            stack: std::mem::replace(&mut self.stack, scope.stack),
            text_matrix: std::mem::replace(&mut self.text_matrix, scope.text_matrix),
            line_matrix: std::mem::replace(&mut self.line_matrix, scope.line_matrix),
            path: std::mem::replace(&mut self.path, scope.path),
            in_text: std::mem::replace(&mut self.in_text, scope.in_text),
            stream: std::mem::replace(&mut self.stream, scope.stream),
        }
    }

    fn execute(&mut self, op_index: usize, op: &Operation) {
        match op.operator.as_str() {
            // -- Graphics state --
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(state) = self.stack.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                let m = Matrix::new(
                    operand(op, 0),
                    operand(op, 1),
                    operand(op, 2),
                    operand(op, 3),
                    operand(op, 4),
                    operand(op, 5),
                );
                self.state.ctm = m.multiply(&self.state.ctm);
            }

            // -- Text objects and state --
            "BT" => self.begin_text(),
            "ET" => self.in_text = false,
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    self.state.font = Some(name.clone());
                }
                self.state.font_size = operand(op, 1);
            }
            "Tc" => self.state.char_spacing = operand(op, 0),
            "Tw" => self.state.word_spacing = operand(op, 0),
            "Tz" => self.state.horizontal_scale = operand(op, 0) / 100.0,
            "TL" => self.state.leading = operand(op, 0),
            "Ts" => self.state.rise = operand(op, 0),
            "Td" => self.move_text(operand(op, 0), operand(op, 1)),
            "TD" => {
                self.state.leading = -operand(op, 1);
                self.move_text(operand(op, 0), operand(op, 1));
            }
            "Tm" => {
                let m = Matrix::new(
                    operand(op, 0),
                    operand(op, 1),
                    operand(op, 2),
                    operand(op, 3),
                    operand(op, 4),
                    operand(op, 5),
                );
                self.text_matrix = m;
                self.line_matrix = m;
            }
            "T*" => self.next_line(),

            // -- Text showing --
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show_string(op_index, 0, bytes);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    self.show_string(op_index, 0, bytes);
                }
            }
            "\"" => {
                self.state.word_spacing = operand(op, 0);
                self.state.char_spacing = operand(op, 1);
                self.next_line();
                if let Some(Object::String(bytes, _)) = op.operands.get(2) {
                    self.show_string(op_index, 0, bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for (element, item) in items.iter().enumerate() {
                        match item {
                            Object::String(bytes, _) => self.show_string(op_index, element, bytes),
                            other => {
                                if let Some(amount) = number(other) {
                                    self.adjust(amount);
                                }
                            }
                        }
                    }
                }
            }

            // -- Path construction --
            "m" | "l" => self.add_point(operand(op, 0), operand(op, 1)),
            "c" => {
                self.add_point(operand(op, 0), operand(op, 1));
                self.add_point(operand(op, 2), operand(op, 3));
                self.add_point(operand(op, 4), operand(op, 5));
            }
            "v" | "y" => {
                self.add_point(operand(op, 0), operand(op, 1));
                self.add_point(operand(op, 2), operand(op, 3));
            }
            "re" => {
                let (x, y, w, h) = (operand(op, 0), operand(op, 1), operand(op, 2), operand(op, 3));
                self.add_point(x, y);
                self.add_point(x + w, y);
                self.add_point(x + w, y + h);
                self.add_point(x, y + h);
            }

            // -- Path painting --
            "S" | "s" => self.paint(Some(PathKind::Stroke)),
            "f" | "F" | "f*" => self.paint(Some(PathKind::Fill)),
            "B" | "B*" | "b" | "b*" => self.paint(Some(PathKind::FillStroke)),
            "n" => self.paint(None),

            // -- XObjects --
            "Do" => self.paint_xobject(op_index, op),

            _ => {}
        }
    }

    fn finish(self, operations: Vec<Operation>) -> PageLayout {
        PageLayout {
            space: self.space,
            operations,
            forms: self.forms,
            glyphs: self.glyphs,
            images: self.images,
            drawings: self.drawings,
            text_objects: self.text_objects,
            order: self.order,
        }
    }
}

/// Interpret the page's content stream.
#[instrument(skip(doc), fields(page = page_id.0))]
pub(crate) fn interpret_page(doc: &Document, page_id: ObjectId) -> Result<PageLayout, SweepError> {
    let space = PageSpace::from_media_box(media_box(doc, page_id)?);
    let resources = page_resources(doc, page_id)?;
    let bytes = page_content_bytes(doc, page_id)?;
    let content = Content::decode(&bytes)
        .map_err(|err| SweepError::Pdf(format!("cannot parse content stream: {}", err)))?;

    let mut interpreter = Interpreter::new(doc, space, &resources);
    for (index, op) in content.operations.iter().enumerate() {
        interpreter.execute(index, op);
    }
    let layout = interpreter.finish(content.operations);

    debug!(
        glyphs = layout.glyphs.len(),
        images = layout.images.len(),
        forms = layout.forms.len(),
        drawings = layout.drawings.len(),
        "page interpreted"
    );
    Ok(layout)
}

/// Interpret bare content on a 600x800 page with no resources.
#[cfg(test)]
pub(crate) fn layout_for(content: &str) -> PageLayout {
    let operations = Content::decode(content.as_bytes()).unwrap().operations;
    let doc = Document::with_version("1.5");
    let space = PageSpace::from_media_box([0.0, 0.0, 600.0, 800.0]);
    let mut interpreter = Interpreter::new(&doc, space, &Dictionary::new());
    for (index, op) in operations.iter().enumerate() {
        interpreter.execute(index, op);
    }
    interpreter.finish(operations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_multiply_applies_left_first() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Matrix::translate(10.0, 5.0);
        let m = scale.multiply(&shift);
        assert_eq!(m.apply(1.0, 1.0), (12.0, 7.0));
    }

    #[test]
    fn glyphs_use_top_left_page_space() {
        let layout = layout_for("BT /F1 10 Tf 100 700 Td (AB) Tj ET");
        assert_eq!(layout.glyphs.len(), 2);
        let first = &layout.glyphs[0];
        // Default width 500/1000 em at 10pt = 5pt per glyph.
        assert!((first.bbox.x0 - 100.0).abs() < 1e-3);
        assert!((first.bbox.x1 - 105.0).abs() < 1e-3);
        // Baseline at y=700 user space => 100 from the top; ascent 8pt.
        assert!((first.bbox.y0 - 92.0).abs() < 1e-3);
        assert!((first.bbox.y1 - 102.0).abs() < 1e-3);
        assert!((layout.glyphs[1].bbox.x0 - 105.0).abs() < 1e-3);
    }

    #[test]
    fn baseline_moves_start_new_lines() {
        let layout = layout_for("BT /F1 10 Tf 12 TL 50 700 Td (one) Tj T* (two) Tj ET");
        let blocks = layout.text_blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "one\ntwo");
    }

    #[test]
    fn each_text_object_is_a_block() {
        let layout = layout_for("BT /F1 10 Tf 50 700 Td (one) Tj ET BT /F1 10 Tf 50 600 Td (two) Tj ET");
        let blocks = layout.text_blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].content, "two");
        assert!(blocks[1].bbox.y0 > blocks[0].bbox.y0);
    }

    #[test]
    fn wide_gaps_become_spaces() {
        let layout = layout_for("BT /F1 10 Tf 50 700 Td [(ab) -1000 (cd)] TJ ET");
        assert_eq!(layout.text_blocks()[0].content, "ab cd");
    }

    #[test]
    fn paths_are_recorded_with_paint_kind() {
        let layout = layout_for("10 10 100 50 re f 0 0 m 20 20 l S 5 5 m 6 6 l n");
        assert_eq!(layout.drawings.len(), 2);
        assert_eq!(layout.drawings[0].kind, PathKind::Fill);
        assert_eq!(layout.drawings[0].bbox, Rect::new(10.0, 740.0, 110.0, 790.0));
        assert_eq!(layout.drawings[1].kind, PathKind::Stroke);
    }

    #[test]
    fn search_finds_every_occurrence() {
        let layout = layout_for(
            "BT /F1 10 Tf 50 700 Td (DRAFT) Tj ET BT /F1 10 Tf 300 100 Td (DRAFT copy) Tj ET",
        );
        let hits = layout.search("DRAFT");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].rects.len(), 1);
        assert!(hits[1].rects[0].x0 >= 300.0 - 1e-3);
        assert!(layout.search("").is_empty());
        assert!(layout.search("FINAL").is_empty());
    }

    #[test]
    fn multi_line_hits_have_one_rect_per_line() {
        let layout = layout_for("BT /F1 10 Tf 12 TL 50 700 Td (top) Tj T* (bottom) Tj ET");
        let hits = layout.search("top\nbottom");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].rects.len(), 2);
    }

    /// One page painting /Fm1, where /Fm1 shows "x" and then paints itself.
    fn self_painting_form() -> (Document, ObjectId) {
        use lopdf::dictionary;
        let mut doc = Document::with_version("1.5");
        let form_id = doc.new_object_id();
        doc.objects.insert(
            form_id,
            Object::Stream(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "Matrix" => vec![1.into(), 0.into(), 0.into(), 1.into(), 10.into(), 0.into()],
                    "Resources" => dictionary! { "XObject" => dictionary! { "Fm1" => form_id } },
                },
                b"BT /F1 10 Tf 0 400 Td (x) Tj ET /Fm1 Do".to_vec(),
            )),
        );
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"/Fm1 Do".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 600.into(), 800.into()],
            "Contents" => content_id,
            "Resources" => dictionary! { "XObject" => dictionary! { "Fm1" => form_id } },
        });
        (doc, page_id)
    }

    #[test]
    fn recursive_forms_stop_at_depth_limit() {
        let (doc, page_id) = self_painting_form();
        let layout = interpret_page(&doc, page_id).unwrap();
        assert_eq!(layout.forms.len(), MAX_FORM_DEPTH);
        assert_eq!(layout.glyphs.len(), MAX_FORM_DEPTH);
        assert_eq!(layout.forms[0].parent, None);
        assert_eq!(layout.forms[1].parent, Some(0));
        assert_eq!(layout.forms[1].op_index, 5);
        // Each level adds the form's 10pt shift.
        assert!((layout.glyphs[0].bbox.x0 - 10.0).abs() < 1e-3);
        assert!((layout.glyphs[2].bbox.x0 - 30.0).abs() < 1e-3);
        assert_eq!(layout.glyphs[2].stream, Some(2));
        assert_eq!(layout.text_blocks().len(), MAX_FORM_DEPTH);
    }

    #[test]
    fn graphics_state_is_restored() {
        let layout = layout_for("q 2 0 0 2 0 0 cm 0 0 m 10 10 l S Q 0 0 m 10 10 l S");
        assert_eq!(layout.drawings[0].bbox.width(), 20.0);
        assert_eq!(layout.drawings[1].bbox.width(), 10.0);
    }
}
