// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// caviard-document — Document-side apply/restore pipeline for Caviard.
//
// Provides the lopdf-backed document wrapper (opaque fills, escrow
// annotations, snapshot overlays), the RedactionApplier orchestrating
// capture → encode → encrypt → fill → escrow-attach for one region, the
// RestoreEngine scanning escrow annotations back out, page-content capture
// from rendered previews, and the recovered-text report writer.

pub mod apply;
pub mod content;
pub mod pdf;
pub mod report;
pub mod restore;

pub use apply::RedactionApplier;
pub use content::{PageContent, RasterPageContent};
pub use pdf::document::RedactedDocument;
pub use report::RecoveryReportWriter;
pub use restore::{RestoreEngine, RestorePhase};

#[cfg(test)]
pub(crate) mod testdoc;
