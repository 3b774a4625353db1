// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Integrity fingerprints — SHA-256 hashing for escrow blobs and documents.

use caviard_core::error::{CaviardError, Result};
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of `data` as a lowercase hex string.
///
/// Used to fingerprint envelope blobs in redaction receipts and document
/// bytes in the audit trail.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Verify that `data` matches the expected SHA-256 hex digest.
pub fn verify_hash(data: &[u8], expected_hex: &str) -> Result<()> {
    let actual = hash_bytes(data);
    if actual == expected_hex {
        Ok(())
    } else {
        Err(CaviardError::IntegrityMismatch {
            expected: expected_hex.to_owned(),
            actual,
        })
    }
}
