// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page preview — a wireframe raster of the page outline and the catalog's
// bounding boxes, scaled to fit the viewer. Uses the `image` and `imageproc`
// crates.

use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect as PixelRect;
use pdfsweep_core::error::{Result, SweepError};
use pdfsweep_core::types::{ObjectKind, PageObject, Rect};
use tracing::{debug, instrument};

use crate::access::PageSize;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const PAGE_OUTLINE: Rgb<u8> = Rgb([160, 160, 160]);
const SELECTED: Rgb<u8> = Rgb([220, 20, 20]);
/// Highlight stroke width, in pixels.
const SELECTED_WIDTH: i32 = 3;

fn kind_colour(kind: ObjectKind) -> Rgb<u8> {
    match kind {
        ObjectKind::Image => Rgb([40, 100, 220]),
        ObjectKind::Vector => Rgb([40, 160, 80]),
        ObjectKind::Text => Rgb([230, 140, 20]),
    }
}

/// A rendered page preview and the page-to-pixel scale it was drawn at.
#[derive(Debug, Clone)]
pub struct Preview {
    pub image: RgbImage,
    pub zoom: f32,
}

impl Preview {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode the preview as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| SweepError::ImageError(format!("image encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

/// Scale that fits a page into `max_width` x `max_height` pixels without
/// enlarging it.
pub fn fit_zoom(page: PageSize, max_width: u32, max_height: u32) -> f32 {
    let zoom_x = max_width as f32 / page.width;
    let zoom_y = max_height as f32 / page.height;
    zoom_x.min(zoom_y).min(1.0)
}

fn to_pixels(rect: &Rect, zoom: f32) -> PixelRect {
    let scaled = rect.scale(zoom);
    let width = (scaled.width().round() as u32).max(1);
    let height = (scaled.height().round() as u32).max(1);
    PixelRect::at(scaled.x0.round() as i32, scaled.y0.round() as i32).of_size(width, height)
}

/// Draw the page outline, every object's box, and the selected object in red.
#[instrument(skip(objects), fields(objects = objects.len()))]
pub fn render_preview(
    page: PageSize,
    objects: &[PageObject],
    selected: Option<usize>,
    max_width: u32,
    max_height: u32,
) -> Result<Preview> {
    if !(page.width > 0.0 && page.height > 0.0) {
        return Err(SweepError::ImageError(format!(
            "page has no area ({} x {})",
            page.width, page.height
        )));
    }
    if max_width == 0 || max_height == 0 {
        return Err(SweepError::ImageError("preview target size is zero".into()));
    }

    let zoom = fit_zoom(page, max_width, max_height);
    let width = ((page.width * zoom).ceil() as u32).max(1);
    let height = ((page.height * zoom).ceil() as u32).max(1);
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);

    draw_hollow_rect_mut(&mut image, PixelRect::at(0, 0).of_size(width, height), PAGE_OUTLINE);

    for object in objects {
        let bbox = object.bbox();
        if bbox.is_empty() {
            continue;
        }
        let colour = kind_colour(object.kind());
        let rect = to_pixels(&bbox, zoom);
        if object.kind() == ObjectKind::Vector && rect.width() <= 2 && rect.height() <= 2 {
            draw_filled_rect_mut(&mut image, rect, colour);
        } else {
            draw_hollow_rect_mut(&mut image, rect, colour);
        }
    }

    if let Some(object) = selected.and_then(|index| objects.get(index)) {
        let rect = to_pixels(&object.bbox(), zoom);
        for inset in 0..SELECTED_WIDTH {
            let grow = SELECTED_WIDTH / 2 - inset;
            let width = (rect.width() as i32 + 2 * grow).max(1) as u32;
            let height = (rect.height() as i32 + 2 * grow).max(1) as u32;
            let ring = PixelRect::at(rect.left() - grow, rect.top() - grow).of_size(width, height);
            draw_hollow_rect_mut(&mut image, ring, SELECTED);
        }
    }

    debug!(width, height, zoom, "Preview rendered");
    Ok(Preview { image, zoom })
}
