// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font metrics and text decoding for the content interpreter.
//
// Only what is needed to place glyphs and recover their text: code length
// (one byte for simple fonts, two for Type0), advance widths from /Widths or
// the descendant font's /W, and a ToUnicode map when the font carries one.

use std::collections::HashMap;
use std::ops::Range;

use lopdf::{Dictionary, Document, Object};
use tracing::debug;

use super::objects::{number, resolve, resolve_dict};

/// Advance width (in 1/1000 em) used when a font gives no width for a code.
const DEFAULT_WIDTH: f32 = 500.0;

/// Most codes a single /W or bfrange entry may expand to.
const MAX_RANGE_SPAN: u32 = 0xFFFF;

/// Metrics and decoding tables for one font resource.
#[derive(Debug, Clone)]
pub(crate) struct FontMetrics {
    two_byte: bool,
    first_char: u32,
    widths: Vec<f32>,
    missing_width: f32,
    cid_widths: HashMap<u32, f32>,
    to_unicode: HashMap<u32, String>,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            two_byte: false,
            first_char: 0,
            widths: Vec::new(),
            missing_width: DEFAULT_WIDTH,
            cid_widths: HashMap::new(),
            to_unicode: HashMap::new(),
        }
    }
}

impl FontMetrics {
    /// Read metrics from a font dictionary. Malformed entries fall back to
    /// defaults rather than failing the page.
    pub(crate) fn load(doc: &Document, font: &Dictionary) -> Self {
        let mut metrics = Self::default();

        let subtype = font.get(b"Subtype").and_then(Object::as_name).unwrap_or_default();
        if subtype == b"Type0" {
            metrics.two_byte = true;
            metrics.missing_width = 1000.0;
            if let Some(descendant) = descendant_font(doc, font) {
                if let Ok(dw) = descendant.get(b"DW") {
                    if let Some(value) = resolve(doc, dw).ok().and_then(number) {
                        metrics.missing_width = value;
                    }
                }
                if let Ok(w) = descendant.get(b"W") {
                    if let Ok(Object::Array(items)) = resolve(doc, w) {
                        metrics.cid_widths = parse_cid_widths(doc, items);
                    }
                }
            }
        } else {
            if let Some(first) = font.get(b"FirstChar").ok().and_then(number) {
                metrics.first_char = first.max(0.0) as u32;
            }
            if let Ok(widths) = font.get(b"Widths") {
                if let Ok(Object::Array(items)) = resolve(doc, widths) {
                    metrics.widths = items
                        .iter()
                        .map(|item| resolve(doc, item).ok().and_then(number).unwrap_or(0.0))
                        .collect();
                }
            }
            if let Some(missing) = font
                .get(b"FontDescriptor")
                .ok()
                .and_then(|object| resolve_dict(doc, object).ok())
                .and_then(|descriptor| descriptor.get(b"MissingWidth").ok())
                .and_then(number)
            {
                if missing > 0.0 {
                    metrics.missing_width = missing;
                }
            }
        }

        if let Ok(object) = font.get(b"ToUnicode") {
            if let Ok(Object::Stream(stream)) = resolve(doc, object) {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                metrics.to_unicode = parse_to_unicode(&data);
                debug!(entries = metrics.to_unicode.len(), "ToUnicode map loaded");
            }
        }

        metrics
    }

    /// Whether codes are two bytes wide.
    pub(crate) fn is_two_byte(&self) -> bool {
        self.two_byte
    }

    /// Split a shown string into character codes and their byte ranges.
    pub(crate) fn codes(&self, bytes: &[u8]) -> Vec<(u32, Range<usize>)> {
        if self.two_byte {
            bytes
                .chunks(2)
                .enumerate()
                .map(|(i, chunk)| {
                    let code = chunk.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
                    (code, i * 2..i * 2 + chunk.len())
                })
                .collect()
        } else {
            bytes
                .iter()
                .enumerate()
                .map(|(i, b)| (u32::from(*b), i..i + 1))
                .collect()
        }
    }

    /// Advance width of `code` in 1/1000 em.
    pub(crate) fn width(&self, code: u32) -> f32 {
        if self.two_byte {
            return self.cid_widths.get(&code).copied().unwrap_or(self.missing_width);
        }
        code.checked_sub(self.first_char)
            .and_then(|index| self.widths.get(index as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.missing_width)
    }

    /// Unicode text for `code`.
    pub(crate) fn decode(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.get(&code) {
            return text.clone();
        }
        if self.two_byte {
            char::from_u32(code).unwrap_or('\u{FFFD}').to_string()
        } else {
            // Latin-1 is a close enough stand-in for WinAnsi/PDFDoc here.
            char::from(code as u8).to_string()
        }
    }
}

fn descendant_font<'a>(doc: &'a Document, font: &'a Dictionary) -> Option<&'a Dictionary> {
    let descendants = resolve(doc, font.get(b"DescendantFonts").ok()?).ok()?;
    match descendants {
        Object::Array(items) => items.first().and_then(|first| resolve_dict(doc, first).ok()),
        _ => None,
    }
}

/// Parse a CIDFont /W array: `c [w1 w2 ...]` and `c_first c_last w` forms.
fn parse_cid_widths(doc: &Document, items: &[Object]) -> HashMap<u32, f32> {
    let mut widths = HashMap::new();
    let values: Vec<&Object> = items.iter().filter_map(|item| resolve(doc, item).ok()).collect();
    let mut i = 0;
    while i < values.len() {
        let Some(first) = number(values[i]) else {
            break;
        };
        let first = first as u32;
        match values.get(i + 1) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    let Some(code) = u32::try_from(offset).ok().and_then(|o| first.checked_add(o)) else {
                        break;
                    };
                    if let Some(w) = resolve(doc, w).ok().and_then(number) {
                        widths.insert(code, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(w)) = (number(last), values.get(i + 2).and_then(|o| number(o))) else {
                    break;
                };
                let last = (last as u32).min(first.saturating_add(MAX_RANGE_SPAN));
                for code in first..=last {
                    widths.insert(code, w);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

#[derive(Debug, PartialEq)]
enum CMapToken {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Word(String),
}

fn tokenize_cmap(data: &[u8]) -> Vec<CMapToken> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'<' if data.get(i + 1) != Some(&b'<') => {
                let start = i + 1;
                let end = data[start..]
                    .iter()
                    .position(|b| *b == b'>')
                    .map_or(data.len(), |p| start + p);
                let digits: Vec<u8> = data[start..end]
                    .iter()
                    .copied()
                    .filter(u8::is_ascii_hexdigit)
                    .collect();
                let bytes = digits
                    .chunks(2)
                    .map(|pair| {
                        let hi = hex_value(pair[0]);
                        let lo = pair.get(1).map_or(0, |b| hex_value(*b));
                        (hi << 4) | lo
                    })
                    .collect();
                tokens.push(CMapToken::Hex(bytes));
                i = end + 1;
            }
            b'[' => {
                tokens.push(CMapToken::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(CMapToken::ArrayEnd);
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !matches!(data[i], b'<' | b'[' | b']' | b'%')
                {
                    i += 1;
                }
                if i == start {
                    i += 1;
                }
                tokens.push(CMapToken::Word(String::from_utf8_lossy(&data[start..i]).into_owned()));
            }
        }
    }
    tokens
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| (u16::from(pair[0]) << 8) | u16::from(*pair.get(1).unwrap_or(&0)))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Add `offset` to the last UTF-16 unit of a bfrange destination.
fn offset_destination(base: &[u8], offset: u32) -> String {
    let mut bytes = base.to_vec();
    if bytes.len() >= 2 {
        let n = bytes.len();
        let last = ((u32::from(bytes[n - 2]) << 8) | u32::from(bytes[n - 1])) + offset;
        bytes[n - 2] = (last >> 8) as u8;
        bytes[n - 1] = last as u8;
    }
    utf16_text(&bytes)
}

/// Parse the bfchar and bfrange sections of a ToUnicode CMap.
pub(crate) fn parse_to_unicode(data: &[u8]) -> HashMap<u32, String> {
    let tokens = tokenize_cmap(data);
    let mut map = HashMap::new();
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            CMapToken::Word(word) if word == "beginbfchar" => {
                i += 1;
                while let (Some(CMapToken::Hex(src)), Some(CMapToken::Hex(dst))) =
                    (tokens.get(i), tokens.get(i + 1))
                {
                    map.insert(code_of(src), utf16_text(dst));
                    i += 2;
                }
            }
            CMapToken::Word(word) if word == "beginbfrange" => {
                i += 1;
                while let (Some(CMapToken::Hex(lo)), Some(CMapToken::Hex(hi))) =
                    (tokens.get(i), tokens.get(i + 1))
                {
                    let (lo, hi) = (code_of(lo), code_of(hi));
                    match tokens.get(i + 2) {
                        Some(CMapToken::Hex(dst)) => {
                            for code in lo..=hi.min(lo.saturating_add(MAX_RANGE_SPAN)) {
                                map.insert(code, offset_destination(dst, code - lo));
                            }
                            i += 3;
                        }
                        Some(CMapToken::ArrayStart) => {
                            i += 3;
                            let mut code = Some(lo);
                            while let Some(CMapToken::Hex(dst)) = tokens.get(i) {
                                if let Some(current) = code {
                                    map.insert(current, utf16_text(dst));
                                    code = current.checked_add(1);
                                }
                                i += 1;
                            }
                            if tokens.get(i) == Some(&CMapToken::ArrayEnd) {
                                i += 1;
                            }
                        }
                        _ => break,
                    }
                }
            }
            _ => i += 1,
        }
    }
    map
}
