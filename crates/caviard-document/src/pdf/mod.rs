// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF plumbing for the redaction pipeline, built on `lopdf`.

pub mod annot;
pub mod document;

pub use document::RedactedDocument;
