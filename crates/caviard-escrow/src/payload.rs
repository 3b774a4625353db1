// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Escrow payload codec — canonical, self-describing serialization of the
// plaintext that gets encrypted: the document region, the machine-readable
// text under it, and the PNG snapshot.
//
// JSON with base64-encoded snapshot bytes. The format is deliberately
// self-describing so a recovered payload can be inspected with standard
// tooling once decrypted.

use tracing::{debug, instrument};

use caviard_core::error::{CaviardError, Result};
use caviard_core::types::EscrowPayload;

/// Serialize a payload to its canonical byte form.
#[instrument(skip_all, fields(text_len = payload.original_text.len(), snapshot_len = payload.snapshot_png.len()))]
pub fn encode(payload: &EscrowPayload) -> Result<Vec<u8>> {
    let bytes = serde_json::to_vec(payload)?;
    debug!(encoded_len = bytes.len(), "payload encoded");
    Ok(bytes)
}

/// Deserialize a payload from bytes produced by [`encode`].
///
/// A missing field, a non-numeric rect component, or bytes that are not the
/// codec's output at all fail with a decode error — the caller treats the
/// escrow as unrecoverable rather than trusting partial data.
#[instrument(skip_all, fields(encoded_len = bytes.len()))]
pub fn decode(bytes: &[u8]) -> Result<EscrowPayload> {
    serde_json::from_slice(bytes)
        .map_err(|e| CaviardError::Decode(format!("malformed escrow payload: {e}")))
}
