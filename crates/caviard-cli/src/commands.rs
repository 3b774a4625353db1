// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand handlers.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use image::{DynamicImage, Rgba, RgbaImage};
use serde::Deserialize;
use tracing::info;

use caviard_core::types::{CancelToken, PixelRect, RasterSize, Region, RestoreReport};
use caviard_core::RedactionConfig;
use caviard_document::content::paint_preview_fill;
use caviard_document::{RasterPageContent, RecoveryReportWriter, RedactedDocument, RedactionApplier, RestoreEngine};
use caviard_escrow::{AuditTrail, ProtectedExport, hash_bytes};

use crate::cli::{
    ApplyArgs, AuditArgs, KeygenArgs, ProtectArgs, RestoreArgs, RestoreTextArgs,
};

// -- Region file --------------------------------------------------------------

/// JSON region file consumed by `caviard apply`:
///
/// ```json
/// {
///   "pages": [
///     {
///       "page": 1,
///       "raster": { "width_px": 1240, "height_px": 1754 },
///       "preview": "page1.png",
///       "regions": [
///         { "Rect": { "x": 80.0, "y": 120.0, "w": 310.0, "h": 24.0 } },
///         { "Polygon": [ { "x": 10.0, "y": 10.0 }, ... ] }
///       ]
///     }
///   ]
/// }
/// ```
///
/// Region coordinates are pixel-space, relative to the declared raster —
/// exactly what an interaction layer drawing on a rendered preview produces.
#[derive(Debug, Deserialize)]
struct RegionFile {
    pages: Vec<PageEntry>,
}

#[derive(Debug, Deserialize)]
struct PageEntry {
    /// 1-indexed page number.
    page: u32,
    /// Dimensions of the preview raster the regions were drawn on.
    raster: RasterSize,
    /// Rendered preview image; required when escrow is requested.
    preview: Option<PathBuf>,
    regions: Vec<Region>,
}

// -- Subcommands --------------------------------------------------------------

pub fn keygen(args: KeygenArgs) -> Result<()> {
    let (private_key, public_key) = caviard_escrow::generate_keypair(args.bits)?;

    fs::write(
        &args.public,
        caviard_escrow::keys::public_key_to_pem(&public_key)?,
    )
    .with_context(|| format!("writing {}", args.public.display()))?;
    fs::write(
        &args.private,
        caviard_escrow::keys::private_key_to_pem(&private_key)?.as_str(),
    )
    .with_context(|| format!("writing {}", args.private.display()))?;

    println!("public key:  {}", args.public.display());
    println!("private key: {}", args.private.display());
    println!("Keep the private key offline — without it, escrowed content is unrecoverable.");
    Ok(())
}

pub fn apply(args: ApplyArgs) -> Result<()> {
    let region_file: RegionFile = serde_json::from_str(
        &fs::read_to_string(&args.regions)
            .with_context(|| format!("reading {}", args.regions.display()))?,
    )
    .context("parsing region file")?;

    let public_key = args
        .public_key
        .as_deref()
        .map(caviard_escrow::load_public_key)
        .transpose()?;

    let mut config = RedactionConfig::default();
    if let Some(step) = args.step {
        config.scanline_step = step;
    }
    let applier = RedactionApplier::new(config);

    let mut doc = RedactedDocument::open(&args.input)?;
    let mut total_regions = 0usize;
    let mut total_escrows = 0usize;

    for entry in &region_file.pages {
        let page_id = doc.page_id(entry.page)?;
        let page_size = doc.page_size(page_id)?;
        let page_text = doc.extract_page_text(entry.page).unwrap_or_default();

        let content = match &entry.preview {
            Some(path) => {
                let bytes =
                    fs::read(path).with_context(|| format!("reading preview {}", path.display()))?;
                RasterPageContent::from_bytes(&bytes, page_size)?
            }
            None => {
                if public_key.is_some() {
                    bail!(
                        "page {}: escrow requested but no preview raster supplied",
                        entry.page
                    );
                }
                // Never consulted without an escrow key; blank stand-in.
                let blank = RgbaImage::from_pixel(
                    entry.raster.width_px,
                    entry.raster.height_px,
                    Rgba([255, 255, 255, 255]),
                );
                RasterPageContent::new(DynamicImage::ImageRgba8(blank), page_size)
            }
        }
        .with_page_text(page_text);

        for region in &entry.regions {
            let result = applier.apply_redaction(
                &mut doc,
                entry.page,
                region,
                entry.raster,
                &content,
                public_key.as_ref(),
            )?;
            total_regions += 1;
            if result.escrow.is_some() {
                total_escrows += 1;
            }
        }

        if args.emit_previews {
            if let Some(path) = &entry.preview {
                emit_redacted_preview(path, &entry.regions)?;
            }
        }
    }

    doc.save(&args.output)?;

    if let Some(db) = &args.audit_db {
        let output_bytes = fs::read(&args.output)?;
        AuditTrail::open(db)?.record(
            "apply",
            &hash_bytes(&output_bytes),
            true,
            Some(&format!(
                "{total_regions} regions redacted, {total_escrows} escrowed"
            )),
        )?;
    }

    println!(
        "{} regions redacted ({} escrowed) -> {}",
        total_regions,
        total_escrows,
        args.output.display()
    );
    Ok(())
}

pub fn restore(args: RestoreArgs) -> Result<()> {
    let doc = RedactedDocument::open(&args.input)?;
    let private_key = caviard_escrow::load_private_key(&args.private_key)?;

    let mut engine = RestoreEngine::new();
    let (mut restored, report) = engine.restore_images(&doc, &private_key, &CancelToken::new())?;
    restored.save(&args.output)?;

    if let Some(db) = &args.audit_db {
        let output_bytes = fs::read(&args.output)?;
        AuditTrail::open(db)?.record(
            "restore",
            &hash_bytes(&output_bytes),
            report.escrows_failed == 0,
            Some(&format!(
                "{} recovered, {} failed",
                report.escrows_recovered, report.escrows_failed
            )),
        )?;
    }

    print_report(&report, &args.output);
    Ok(())
}

pub fn restore_text(args: RestoreTextArgs) -> Result<()> {
    let doc = RedactedDocument::open(&args.input)?;
    let private_key = caviard_escrow::load_private_key(&args.private_key)?;

    let mut engine = RestoreEngine::new();
    let (entries, report) = engine.restore_text(&doc, &private_key, &CancelToken::new())?;

    let mut writer = RecoveryReportWriter::new();
    writer.set_title(format!(
        "Recovered content — {}",
        args.input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    ));
    writer.write_to_file(&entries, &report, &args.output)?;

    print_report(&report, &args.output);
    Ok(())
}

pub fn protect(args: ProtectArgs) -> Result<()> {
    let document = fs::read(&args.input)?;
    let sealed = ProtectedExport::new(args.passphrase).seal(&document)?;
    fs::write(&args.output, &sealed)?;
    info!(input = %args.input.display(), output = %args.output.display(), "export sealed");
    println!("sealed -> {}", args.output.display());
    Ok(())
}

pub fn unprotect(args: ProtectArgs) -> Result<()> {
    let sealed = fs::read(&args.input)?;
    let document = ProtectedExport::new(args.passphrase).open(&sealed)?;
    fs::write(&args.output, &document)?;
    println!("opened -> {}", args.output.display());
    Ok(())
}

pub fn audit(args: AuditArgs) -> Result<()> {
    let trail = AuditTrail::open(&args.db)?;
    let entries = trail.recent_entries(args.limit)?;
    if entries.is_empty() {
        println!("audit trail is empty");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}  {:12}  {}  {}  {}",
            entry.timestamp,
            entry.action,
            if entry.success { "ok " } else { "FAIL" },
            &entry.document_hash[..16.min(entry.document_hash.len())],
            entry.details.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

// -- Helpers ------------------------------------------------------------------

/// Write `<preview>.redacted.png` with the page's regions blacked out, so
/// the operator sees the preview the way the output renders.
fn emit_redacted_preview(preview: &Path, regions: &[Region]) -> Result<()> {
    let mut raster = image::open(preview)
        .with_context(|| format!("reading preview {}", preview.display()))?
        .to_rgba8();

    let rects: Vec<PixelRect> = regions
        .iter()
        .map(|region| match region {
            Region::Rect(rect) => *rect,
            // Preview approximation for polygons: their pixel bounding box.
            Region::Polygon(points) => {
                let xs = points.iter().map(|p| p.x);
                let ys = points.iter().map(|p| p.y);
                let x0 = xs.clone().fold(f64::INFINITY, f64::min);
                let y0 = ys.clone().fold(f64::INFINITY, f64::min);
                let x1 = xs.fold(f64::NEG_INFINITY, f64::max);
                let y1 = ys.fold(f64::NEG_INFINITY, f64::max);
                PixelRect {
                    x: x0,
                    y: y0,
                    w: x1 - x0,
                    h: y1 - y0,
                }
            }
        })
        .collect();

    paint_preview_fill(&mut raster, &rects);

    let out_path = preview.with_extension("redacted.png");
    raster
        .save(&out_path)
        .with_context(|| format!("writing {}", out_path.display()))?;
    println!("preview -> {}", out_path.display());
    Ok(())
}

fn print_report(report: &RestoreReport, output: &Path) {
    println!(
        "{} pages scanned, {} escrows recovered, {} failed -> {}",
        report.pages_processed,
        report.escrows_recovered,
        report.escrows_failed,
        output.display()
    );
    if report.nothing_recovered() {
        println!("no escrows were recovered — the output document is unchanged");
    }
    for failure in &report.failures {
        println!("  page {}: {}", failure.page, failure.reason);
    }
}
