// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinate mapper — converts pixel-space regions from a rendered preview
// into document-space geometry, and back again for snapshot cropping.

use caviard_core::types::{
    DocPoint, DocumentRegion, PageSize, PixelPoint, PixelRect, RasterSize,
};
use tracing::debug;

/// Scale transform between one page's preview raster and its physical page.
///
/// `sx = page_w / raster_w`, `sy = page_h / raster_h`. The transform is pure
/// scaling — no clamping is applied, so a region drawn past the raster edge
/// maps to out-of-page coordinates. Callers are responsible for keeping input
/// regions inside the raster.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    sx: f64,
    sy: f64,
}

impl CoordinateMapper {
    /// Build the transform for one rendered page.
    ///
    /// The raster must be non-empty; a zero-sized raster has no meaningful
    /// scale and is an interaction-layer bug.
    pub fn new(raster: RasterSize, page: PageSize) -> Self {
        let sx = page.width / raster.width_px as f64;
        let sy = page.height / raster.height_px as f64;
        debug!(sx, sy, "coordinate transform built");
        Self { sx, sy }
    }

    /// Map a pixel rectangle componentwise into a document-space region.
    pub fn map_rect(&self, rect: &PixelRect) -> DocumentRegion {
        DocumentRegion::new(
            rect.x * self.sx,
            rect.y * self.sy,
            (rect.x + rect.w) * self.sx,
            (rect.y + rect.h) * self.sy,
        )
    }

    /// Map a single pixel point into document space.
    pub fn map_point(&self, point: &PixelPoint) -> DocPoint {
        DocPoint {
            x: point.x * self.sx,
            y: point.y * self.sy,
        }
    }

    /// Map every vertex of a polygon into document space, preserving order.
    pub fn map_polygon(&self, points: &[PixelPoint]) -> Vec<DocPoint> {
        points.iter().map(|p| self.map_point(p)).collect()
    }

    /// Inverse transform: document-space region back to preview pixels.
    ///
    /// Used by snapshot capture to crop the escrowed bitmap out of the
    /// rendered raster.
    pub fn unmap_region(&self, region: &DocumentRegion) -> PixelRect {
        PixelRect {
            x: region.x0 / self.sx,
            y: region.y0 / self.sy,
            w: region.width() / self.sx,
            h: region.height() / self.sy,
        }
    }
}
