// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page content capture — what sits under a region before the fill destroys
// it. The interaction layer already holds a rendered raster of each page;
// the escrow snapshot is cropped out of that raster via the inverse
// coordinate transform, and machine-readable text comes from the document's
// text layer.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect as PixelBounds;
use tracing::{debug, instrument};

use caviard_core::error::{CaviardError, Result};
use caviard_core::types::{DocumentRegion, PageSize, PixelRect, RasterSize};
use caviard_geometry::CoordinateMapper;

/// Source of escrowable content for one page.
///
/// The applier asks for text and a snapshot of the bounding region right
/// before painting; implementations with a richer renderer (the interaction
/// layer) can supply region-accurate text, while [`RasterPageContent`] works
/// from what a preview raster and the PDF text layer can give.
pub trait PageContent {
    /// Machine-readable text under `region`.
    fn text_in_region(&self, region: &DocumentRegion) -> String;

    /// PNG snapshot of `region` as rendered.
    fn snapshot_png(&self, region: &DocumentRegion) -> Result<Vec<u8>>;
}

/// Page content backed by a rendered preview raster.
///
/// Snapshots are cropped out of the raster through the inverse coordinate
/// transform. Region-accurate text needs a positioned text layer that only a
/// renderer has, so this accessor stores page-level text supplied by the
/// caller (typically `RedactedDocument::extract_page_text`) and returns it
/// for any region on the page — a best-effort superset of what was removed.
pub struct RasterPageContent {
    raster: DynamicImage,
    mapper: CoordinateMapper,
    page_text: String,
}

impl RasterPageContent {
    /// Wrap an already-decoded page raster rendered at any resolution.
    pub fn new(raster: DynamicImage, page: PageSize) -> Self {
        let size = RasterSize {
            width_px: raster.width(),
            height_px: raster.height(),
        };
        Self {
            raster,
            mapper: CoordinateMapper::new(size, page),
            page_text: String::new(),
        }
    }

    /// Decode a PNG/JPEG preview and wrap it.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8], page: PageSize) -> Result<Self> {
        let raster = image::load_from_memory(data)
            .map_err(|err| CaviardError::Image(format!("failed to decode preview: {err}")))?;
        debug!(
            width = raster.width(),
            height = raster.height(),
            "preview decoded"
        );
        Ok(Self::new(raster, page))
    }

    /// Attach the page's machine-readable text.
    pub fn with_page_text(mut self, text: impl Into<String>) -> Self {
        self.page_text = text.into();
        self
    }

    pub fn raster_size(&self) -> RasterSize {
        RasterSize {
            width_px: self.raster.width(),
            height_px: self.raster.height(),
        }
    }
}

impl PageContent for RasterPageContent {
    fn text_in_region(&self, _region: &DocumentRegion) -> String {
        self.page_text.clone()
    }

    fn snapshot_png(&self, region: &DocumentRegion) -> Result<Vec<u8>> {
        let pixel = self.mapper.unmap_region(region);

        // Clamp the crop window to the raster; a region drawn slightly past
        // the page edge still snapshots whatever is actually rendered.
        let x = pixel.x.max(0.0).floor() as u32;
        let y = pixel.y.max(0.0).floor() as u32;
        let x_end = ((pixel.x + pixel.w).ceil() as u32).min(self.raster.width());
        let y_end = ((pixel.y + pixel.h).ceil() as u32).min(self.raster.height());

        if x >= x_end || y >= y_end {
            return Err(CaviardError::Image(format!(
                "region ({:.1},{:.1})-({:.1},{:.1}) maps outside the {}x{} raster",
                region.x0,
                region.y0,
                region.x1,
                region.y1,
                self.raster.width(),
                self.raster.height()
            )));
        }

        let crop = self.raster.crop_imm(x, y, x_end - x, y_end - y);
        let mut bytes = Vec::new();
        crop.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|err| CaviardError::Image(format!("snapshot encoding failed: {err}")))?;
        Ok(bytes)
    }
}

/// Paint the opaque fill onto a preview raster so the on-screen page matches
/// the redacted output. Rectangles are clamped to the raster; zero-area
/// rectangles are skipped.
pub fn paint_preview_fill(raster: &mut RgbaImage, rects: &[PixelRect]) {
    let (width, height) = (raster.width() as i64, raster.height() as i64);
    for rect in rects {
        let x = (rect.x.floor() as i64).clamp(0, width);
        let y = (rect.y.floor() as i64).clamp(0, height);
        let x_end = ((rect.x + rect.w).ceil() as i64).clamp(0, width);
        let y_end = ((rect.y + rect.h).ceil() as i64).clamp(0, height);
        if x_end <= x || y_end <= y {
            continue;
        }
        draw_filled_rect_mut(
            raster,
            PixelBounds::at(x as i32, y as i32).of_size((x_end - x) as u32, (y_end - y) as u32),
            Rgba([0, 0, 0, 255]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_page_content() -> RasterPageContent {
        let raster = RgbaImage::from_pixel(300, 300, Rgba([255, 255, 255, 255]));
        RasterPageContent::new(
            DynamicImage::ImageRgba8(raster),
            PageSize {
                width: 600.0,
                height: 600.0,
            },
        )
    }

    #[test]
    fn snapshot_crops_through_inverse_transform() {
        let content = white_page_content();
        // 600pt page over 300px raster: document units are 2x pixels.
        let png = content
            .snapshot_png(&DocumentRegion::new(20.0, 20.0, 60.0, 60.0))
            .unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 20);
        assert_eq!(decoded.height(), 20);
    }

    #[test]
    fn snapshot_clamps_to_raster_edge() {
        let content = white_page_content();
        let png = content
            .snapshot_png(&DocumentRegion::new(580.0, 580.0, 660.0, 660.0))
            .unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 10);
        assert_eq!(decoded.height(), 10);
    }

    #[test]
    fn snapshot_fully_outside_is_an_error() {
        let content = white_page_content();
        let result = content.snapshot_png(&DocumentRegion::new(700.0, 700.0, 800.0, 800.0));
        assert!(matches!(result, Err(CaviardError::Image(_))));
    }

    #[test]
    fn page_text_is_returned_for_any_region() {
        let content = white_page_content().with_page_text("Account 1234");
        let text = content.text_in_region(&DocumentRegion::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(text, "Account 1234");
    }

    #[test]
    fn preview_fill_blacks_out_pixels() {
        let mut raster = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        paint_preview_fill(
            &mut raster,
            &[PixelRect {
                x: 10.0,
                y: 10.0,
                w: 20.0,
                h: 20.0,
            }],
        );
        assert_eq!(raster.get_pixel(15, 15), &Rgba([0, 0, 0, 255]));
        assert_eq!(raster.get_pixel(50, 50), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn preview_fill_skips_degenerate_rects() {
        let mut raster = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        paint_preview_fill(
            &mut raster,
            &[PixelRect {
                x: 20.0,
                y: 20.0,
                w: 5.0,
                h: 5.0,
            }],
        );
        assert_eq!(raster.get_pixel(5, 5), &Rgba([255, 255, 255, 255]));
    }
}
