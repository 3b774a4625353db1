// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Caviard redaction engine.
//
// Two coordinate systems exist side by side. Pixel space is the rendered
// preview the interaction layer draws on (origin top-left, y down, units are
// pixels). Document space is the physical page (origin top-left, y down,
// units are PDF points). The PDF layer flips to PDF user space (y up) when it
// touches page content; nothing above it needs to know.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Discriminator tag carried in the title field of every escrow annotation.
///
/// A restore scan treats any text annotation whose title equals this constant
/// as an escrow candidate; everything else is foreign and ignored.
pub const ESCROW_DISCRIMINATOR: &str = "CAVBLOB";

// -- Pixel space --------------------------------------------------------------

/// A point on the rendered preview, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

/// An axis-aligned rectangle on the rendered preview, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// A redaction region as produced by the interaction layer.
///
/// Immutable once captured: the apply pipeline never mutates a region, it
/// maps it into document space and works on the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Region {
    /// Mouse-dragged rectangle.
    Rect(PixelRect),
    /// Freeform lasso outline, ordered vertex sequence.
    Polygon(Vec<PixelPoint>),
}

/// Dimensions of the rendered preview raster, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterSize {
    pub width_px: u32,
    pub height_px: u32,
}

// -- Document space -----------------------------------------------------------

/// Dimensions of a physical page, in document units (PDF points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// A polygon vertex in document space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocPoint {
    pub x: f64,
    pub y: f64,
}

/// An axis-aligned rectangle in document space.
///
/// Invariant: `x1 >= x0` and `y1 >= y0`, enforced by [`DocumentRegion::new`]
/// normalising its corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentRegion {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl DocumentRegion {
    /// Build a region from two opposite corners, normalising so the
    /// invariant holds regardless of the order the corners arrive in.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Bounding box of a non-empty vertex set.
    ///
    /// Returns `None` for an empty slice.
    pub fn bounding(points: &[DocPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut region = Self::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            region.x0 = region.x0.min(p.x);
            region.y0 = region.y0.min(p.y);
            region.x1 = region.x1.max(p.x);
            region.y1 = region.y1.max(p.y);
        }
        Some(region)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Smallest region covering both `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

// -- Escrow -------------------------------------------------------------------

/// The plaintext preserved for one redaction: everything needed to put the
/// original content back.
///
/// Transient — built, encrypted, and dropped within one apply call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscrowPayload {
    /// Where on the page the content was removed from.
    pub region: DocumentRegion,
    /// Machine-readable text that was under the region.
    pub original_text: String,
    /// PNG snapshot of the region as rendered.
    #[serde(with = "crate::types::base64_bytes")]
    pub snapshot_png: Vec<u8>,
}

/// Receipt for a successfully attached escrow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowReceipt {
    /// Annotation name (`/NM`), a fresh UUID per escrow.
    pub annotation_name: String,
    /// SHA-256 hex digest of the base64 blob, for the audit trail.
    pub blob_sha256: String,
}

/// Outcome of one `apply_redaction` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionResult {
    /// 1-indexed page the redaction landed on.
    pub page: u32,
    /// Bounding document-space region that was covered.
    pub region: DocumentRegion,
    /// Number of opaque rectangles painted (1 for a rectangle region, the
    /// decomposition count for a polygon).
    pub rectangles_painted: usize,
    /// Present iff an escrow was captured and attached.
    pub escrow: Option<EscrowReceipt>,
}

// -- Restore ------------------------------------------------------------------

/// One escrow annotation that could not be recovered during a restore scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowFailure {
    /// 1-indexed page the annotation sits on.
    pub page: u32,
    /// Human-readable reason (format error, wrong key, tamper, bad payload).
    pub reason: String,
}

/// Summary of a completed restore scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestoreReport {
    pub pages_processed: u32,
    pub escrows_recovered: u32,
    pub escrows_failed: u32,
    pub failures: Vec<EscrowFailure>,
}

impl RestoreReport {
    /// True when the scan completed without recovering anything — callers
    /// must surface this rather than silently emitting an unchanged document.
    pub fn nothing_recovered(&self) -> bool {
        self.escrows_recovered == 0
    }
}

/// Recovered text for one escrow, produced by the text-extraction restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveredText {
    pub page: u32,
    pub region: DocumentRegion,
    pub text: String,
}

// -- Cancellation -------------------------------------------------------------

/// Cooperative cancellation flag shared between an operation and its caller.
///
/// Multi-page operations check the token between pages; once cancelled they
/// return [`CaviardError::Cancelled`](crate::error::CaviardError) and discard
/// partial output.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

// -- Serde helper -------------------------------------------------------------

/// Serialize `Vec<u8>` as standard base64 so the payload codec stays
/// self-describing text throughout.
pub mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
