// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Restore engine — scans a document's escrow annotations, decrypts and
// decodes each, and reconstructs the content they preserve.
//
// Per-document state machine: NotStarted → Scanning → Complete. A corrupt
// or foreign annotation is recorded as a failed escrow and the scan
// continues; it never aborts the whole operation.
//
// Restoration comes in two distinct flavours (the original conflated them):
// image reinstatement, overlaying recovered snapshots onto a fresh copy of
// the document, and text extraction, collecting the recovered text without
// touching page content.

use rsa::RsaPrivateKey;
use tracing::{debug, info, instrument, warn};

use caviard_core::error::{CaviardError, Result};
use caviard_core::types::{
    CancelToken, EscrowFailure, EscrowPayload, RecoveredText, RestoreReport,
};

use crate::pdf::document::RedactedDocument;

/// Where a restore pass currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePhase {
    NotStarted,
    Scanning,
    Complete,
}

/// Drives one restore pass over a document.
pub struct RestoreEngine {
    phase: RestorePhase,
}

impl RestoreEngine {
    pub fn new() -> Self {
        Self {
            phase: RestorePhase::NotStarted,
        }
    }

    pub fn phase(&self) -> RestorePhase {
        self.phase
    }

    /// Image-reinstatement restore: returns a new document with every
    /// recoverable snapshot overlaid above existing content at its original
    /// region, plus the scan report.
    ///
    /// Successfully restored escrow annotations are removed from the output;
    /// failed ones stay in place so a later attempt with the right key can
    /// still find them. The source document is never mutated — on
    /// cancellation the partial output is dropped, not returned.
    #[instrument(skip_all, fields(pages = source.page_count()))]
    pub fn restore_images(
        &mut self,
        source: &RedactedDocument,
        private_key: &RsaPrivateKey,
        cancel: &CancelToken,
    ) -> Result<(RedactedDocument, RestoreReport)> {
        self.phase = RestorePhase::Scanning;
        let mut output = source.clone();
        let mut report = RestoreReport::default();

        for (page_number, page_id) in output.pages() {
            if cancel.is_cancelled() {
                self.phase = RestorePhase::NotStarted;
                return Err(CaviardError::Cancelled);
            }

            let escrows = output.escrow_annotations(page_id)?;
            let mut restored_indices = Vec::new();

            for (index, blob) in escrows {
                match recover_payload(private_key, &blob).and_then(|payload| {
                    output
                        .overlay_snapshot(page_id, &payload.region, &payload.snapshot_png)
                        .map(|_| payload)
                }) {
                    Ok(payload) => {
                        debug!(page_number, region = ?payload.region, "escrow reinstated");
                        report.escrows_recovered += 1;
                        restored_indices.push(index);
                    }
                    Err(err) => {
                        warn!(page_number, %err, "escrow could not be recovered");
                        report.escrows_failed += 1;
                        report.failures.push(EscrowFailure {
                            page: page_number,
                            reason: err.to_string(),
                        });
                    }
                }
            }

            output.remove_annotations(page_id, &restored_indices)?;
            report.pages_processed += 1;
        }

        self.phase = RestorePhase::Complete;
        if report.nothing_recovered() {
            warn!("scan complete, no escrows recovered — output document is unchanged");
        }
        info!(
            pages = report.pages_processed,
            recovered = report.escrows_recovered,
            failed = report.escrows_failed,
            "image restore complete"
        );
        Ok((output, report))
    }

    /// Text-extraction restore: collects the recovered text of every
    /// readable escrow without touching page content.
    #[instrument(skip_all, fields(pages = source.page_count()))]
    pub fn restore_text(
        &mut self,
        source: &RedactedDocument,
        private_key: &RsaPrivateKey,
        cancel: &CancelToken,
    ) -> Result<(Vec<RecoveredText>, RestoreReport)> {
        self.phase = RestorePhase::Scanning;
        let mut entries = Vec::new();
        let mut report = RestoreReport::default();

        for (page_number, page_id) in source.pages() {
            if cancel.is_cancelled() {
                self.phase = RestorePhase::NotStarted;
                return Err(CaviardError::Cancelled);
            }

            for (_, blob) in source.escrow_annotations(page_id)? {
                match recover_payload(private_key, &blob) {
                    Ok(payload) => {
                        report.escrows_recovered += 1;
                        entries.push(RecoveredText {
                            page: page_number,
                            region: payload.region,
                            text: payload.original_text,
                        });
                    }
                    Err(err) => {
                        warn!(page_number, %err, "escrow could not be recovered");
                        report.escrows_failed += 1;
                        report.failures.push(EscrowFailure {
                            page: page_number,
                            reason: err.to_string(),
                        });
                    }
                }
            }
            report.pages_processed += 1;
        }

        self.phase = RestorePhase::Complete;
        if report.nothing_recovered() {
            warn!("scan complete, no escrows recovered");
        }
        info!(
            pages = report.pages_processed,
            recovered = report.escrows_recovered,
            failed = report.escrows_failed,
            "text restore complete"
        );
        Ok((entries, report))
    }
}

impl Default for RestoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrypt and decode one escrow blob. Every failure mode maps to one of
/// the per-annotation errors the scan records and skips over.
fn recover_payload(private_key: &RsaPrivateKey, blob: &str) -> Result<EscrowPayload> {
    let plaintext = caviard_escrow::decrypt(private_key, blob)?;
    caviard_escrow::payload::decode(&plaintext)
}
