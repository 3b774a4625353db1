// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// caviard-escrow — Cryptographic foundation for reversible redaction.
//
// Everything a redaction escrow needs: hybrid RSA-OAEP + AES-256-GCM
// envelope encryption with its binary framing, the canonical payload codec,
// PEM key-material loading, blob fingerprinting, the audit trail, and
// passphrase-protected export wrapping.

pub mod audit;
pub mod envelope;
pub mod export;
pub mod integrity;
pub mod keys;
pub mod payload;

pub use audit::AuditTrail;
pub use envelope::{decrypt, encrypt};
pub use export::ProtectedExport;
pub use integrity::{hash_bytes, verify_hash};
pub use keys::{generate_keypair, load_private_key, load_public_key};
