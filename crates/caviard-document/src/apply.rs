// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redaction applier — orchestrates capture → encode → encrypt → opaque-fill
// → escrow-attach for one region on one page.
//
// Ordering invariant: capture-before-destroy. The escrow must be captured
// and successfully encrypted (and its annotation attached) before the
// irreversible fill is painted. Any failure on the escrow path aborts the
// call with the document untouched — a region requested with escrow can
// never end up redacted without one.

use rsa::RsaPublicKey;
use tracing::{debug, info, instrument, warn};

use caviard_core::error::{CaviardError, Result};
use caviard_core::types::{
    DocumentRegion, EscrowPayload, EscrowReceipt, RasterSize, RedactionResult, Region,
};
use caviard_core::RedactionConfig;
use caviard_geometry::{CoordinateMapper, ScanlineDecomposer};

use crate::content::PageContent;
use crate::pdf::document::RedactedDocument;

/// Applies one redaction region to one page of the output document.
pub struct RedactionApplier {
    config: RedactionConfig,
}

impl RedactionApplier {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    /// Redact `region` (pixel space, relative to a `raster`-sized preview)
    /// on the 1-indexed `page_number`.
    ///
    /// With `escrow_key` supplied, the content under the region is captured,
    /// encrypted, and attached as a zero-opacity escrow annotation before
    /// the fill goes down. Without it, the redaction is irreversible by
    /// design — no escrow is attempted.
    #[instrument(skip_all, fields(page_number, escrow = escrow_key.is_some()))]
    pub fn apply_redaction(
        &self,
        doc: &mut RedactedDocument,
        page_number: u32,
        region: &Region,
        raster: RasterSize,
        content: &dyn PageContent,
        escrow_key: Option<&RsaPublicKey>,
    ) -> Result<RedactionResult> {
        let page_id = doc.page_id(page_number)?;
        let page = doc.page_size(page_id)?;
        let mapper = CoordinateMapper::new(raster, page);

        // Map into document space; polygons additionally decompose into the
        // axis-aligned rectangles the fill primitive accepts.
        let (bounding, rects) = match region {
            Region::Rect(rect) => {
                let mapped = mapper.map_rect(rect);
                (mapped, vec![mapped])
            }
            Region::Polygon(points) => {
                let mapped = mapper.map_polygon(points);
                let rects = ScanlineDecomposer::new(self.config.scanline_step).decompose(&mapped)?;
                let bounding = DocumentRegion::bounding(&mapped).ok_or_else(|| {
                    CaviardError::Geometry("polygon has no vertices".to_string())
                })?;
                (bounding, rects)
            }
        };

        if rects.is_empty() {
            // Degenerate (flat) polygon: nothing would be destroyed, so
            // nothing is captured either.
            warn!("region decomposed to an empty rectangle set, nothing to redact");
            return Ok(RedactionResult {
                page: page_number,
                region: bounding,
                rectangles_painted: 0,
                escrow: None,
            });
        }

        // Escrow first. Every step on this path can fail and must do so
        // before the page is touched.
        let escrow = match escrow_key {
            Some(public_key) => {
                let payload = EscrowPayload {
                    region: bounding,
                    original_text: content.text_in_region(&bounding),
                    snapshot_png: content.snapshot_png(&bounding)?,
                };
                let encoded = caviard_escrow::payload::encode(&payload)?;
                let blob = caviard_escrow::encrypt(public_key, &encoded)?;
                let annotation_name = doc.attach_escrow(page_id, &bounding, &blob)?;
                debug!(%annotation_name, "escrow attached");
                Some(EscrowReceipt {
                    annotation_name,
                    blob_sha256: caviard_escrow::hash_bytes(blob.as_bytes()),
                })
            }
            None => None,
        };

        let rectangles_painted = doc.paint_fill(page_id, &rects, self.config.fill_color)?;

        info!(
            page_number,
            rectangles_painted,
            escrowed = escrow.is_some(),
            "redaction applied"
        );
        Ok(RedactionResult {
            page: page_number,
            region: bounding,
            rectangles_painted,
            escrow,
        })
    }
}

impl Default for RedactionApplier {
    fn default() -> Self {
        Self::new(RedactionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    use image::{DynamicImage, Rgba, RgbaImage};
    use rsa::{RsaPrivateKey, RsaPublicKey};

    use caviard_core::error::CaviardError;
    use caviard_core::types::{PageSize, PixelPoint, PixelRect};

    use crate::content::RasterPageContent;
    use crate::testdoc;

    fn keypair() -> &'static (RsaPrivateKey, RsaPublicKey) {
        static KEYS: OnceLock<(RsaPrivateKey, RsaPublicKey)> = OnceLock::new();
        KEYS.get_or_init(|| caviard_escrow::generate_keypair(2048).expect("keygen failed"))
    }

    fn raster() -> RasterSize {
        RasterSize {
            width_px: 300,
            height_px: 300,
        }
    }

    fn page_content(text: &str) -> RasterPageContent {
        let pixels = RgbaImage::from_pixel(300, 300, Rgba([255, 255, 255, 255]));
        RasterPageContent::new(
            DynamicImage::ImageRgba8(pixels),
            PageSize {
                width: 600.0,
                height: 600.0,
            },
        )
        .with_page_text(text)
    }

    fn rect_region() -> Region {
        Region::Rect(PixelRect {
            x: 10.0,
            y: 10.0,
            w: 20.0,
            h: 20.0,
        })
    }

    #[test]
    fn redaction_without_key_is_irreversible() {
        let mut doc = testdoc::single_page(600.0, 600.0);
        let applier = RedactionApplier::default();

        let result = applier
            .apply_redaction(
                &mut doc,
                1,
                &rect_region(),
                raster(),
                &page_content(""),
                None,
            )
            .unwrap();

        assert_eq!(result.page, 1);
        assert_eq!(result.region, DocumentRegion::new(20.0, 20.0, 60.0, 60.0));
        assert_eq!(result.rectangles_painted, 1);
        assert!(result.escrow.is_none());

        let page_id = doc.page_id(1).unwrap();
        assert!(doc.escrow_annotations(page_id).unwrap().is_empty());
    }

    #[test]
    fn escrowed_redaction_round_trips_through_the_blob() {
        let (private_key, public_key) = keypair();
        let mut doc = testdoc::single_page(600.0, 600.0);
        let applier = RedactionApplier::default();

        let result = applier
            .apply_redaction(
                &mut doc,
                1,
                &rect_region(),
                raster(),
                &page_content("Account 1234"),
                Some(public_key),
            )
            .unwrap();

        let receipt = result.escrow.expect("escrow receipt expected");
        assert_eq!(receipt.blob_sha256.len(), 64);

        let page_id = doc.page_id(1).unwrap();
        let escrows = doc.escrow_annotations(page_id).unwrap();
        assert_eq!(escrows.len(), 1);

        let decrypted = caviard_escrow::decrypt(private_key, &escrows[0].1).unwrap();
        let payload = caviard_escrow::payload::decode(&decrypted).unwrap();
        assert_eq!(payload.region, DocumentRegion::new(20.0, 20.0, 60.0, 60.0));
        assert_eq!(payload.original_text, "Account 1234");
        let snapshot = image::load_from_memory(&payload.snapshot_png).unwrap();
        assert_eq!(snapshot.width(), 20);
        assert_eq!(snapshot.height(), 20);
    }

    #[test]
    fn polygon_decomposes_into_multiple_fill_rects() {
        let mut doc = testdoc::single_page(600.0, 600.0);
        let applier = RedactionApplier::default();

        let triangle = Region::Polygon(vec![
            PixelPoint { x: 50.0, y: 50.0 },
            PixelPoint { x: 150.0, y: 50.0 },
            PixelPoint { x: 50.0, y: 150.0 },
        ]);
        let result = applier
            .apply_redaction(&mut doc, 1, &triangle, raster(), &page_content(""), None)
            .unwrap();

        assert!(result.rectangles_painted > 10);
        assert_eq!(result.region, DocumentRegion::new(100.0, 100.0, 300.0, 300.0));
    }

    #[test]
    fn degenerate_polygon_is_rejected_untouched() {
        let mut doc = testdoc::single_page(600.0, 600.0);
        let applier = RedactionApplier::default();

        let two_points = Region::Polygon(vec![
            PixelPoint { x: 0.0, y: 0.0 },
            PixelPoint { x: 10.0, y: 10.0 },
        ]);
        let result =
            applier.apply_redaction(&mut doc, 1, &two_points, raster(), &page_content(""), None);
        assert!(matches!(result, Err(CaviardError::Geometry(_))));
    }

    #[test]
    fn flat_polygon_paints_and_escrows_nothing() {
        let (_, public_key) = keypair();
        let mut doc = testdoc::single_page(600.0, 600.0);
        let applier = RedactionApplier::default();

        let flat = Region::Polygon(vec![
            PixelPoint { x: 10.0, y: 40.0 },
            PixelPoint { x: 50.0, y: 40.0 },
            PixelPoint { x: 90.0, y: 40.0 },
        ]);
        let result = applier
            .apply_redaction(
                &mut doc,
                1,
                &flat,
                raster(),
                &page_content("text"),
                Some(public_key),
            )
            .unwrap();

        assert_eq!(result.rectangles_painted, 0);
        assert!(result.escrow.is_none());
        let page_id = doc.page_id(1).unwrap();
        assert!(doc.escrow_annotations(page_id).unwrap().is_empty());
    }

    #[test]
    fn escrow_failure_leaves_the_document_untouched() {
        let (_, public_key) = keypair();
        let mut doc = testdoc::single_page(600.0, 600.0);
        let applier = RedactionApplier::default();

        // Region far outside the raster: snapshot capture must fail, and the
        // failure must abort the call before any fill or annotation lands.
        let outside = Region::Rect(PixelRect {
            x: 400.0,
            y: 400.0,
            w: 50.0,
            h: 50.0,
        });
        let result = applier.apply_redaction(
            &mut doc,
            1,
            &outside,
            raster(),
            &page_content("text"),
            Some(public_key),
        );
        assert!(matches!(result, Err(CaviardError::Image(_))));

        let page_id = doc.page_id(1).unwrap();
        assert!(doc.escrow_annotations(page_id).unwrap().is_empty());

        // The document still serialises and reloads cleanly, with its
        // original text intact.
        let bytes = doc.to_bytes().unwrap();
        let reloaded = RedactedDocument::from_bytes(&bytes).unwrap();
        assert!(
            reloaded
                .extract_page_text(1)
                .unwrap()
                .contains("Confidential line")
        );
    }

    #[test]
    fn out_of_range_page_is_rejected() {
        let mut doc = testdoc::single_page(600.0, 600.0);
        let applier = RedactionApplier::default();
        let result = applier.apply_redaction(
            &mut doc,
            7,
            &rect_region(),
            raster(),
            &page_content(""),
            None,
        );
        assert!(matches!(result, Err(CaviardError::Pdf(_))));
    }
}
