// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Protected export — optional passphrase wrapping of a finished redacted
// document, via age (scrypt). The redaction core never requires this; it is
// the document-level protection an operator can add on top of the per-region
// escrows, which carry their own independent encryption.

use std::io::{Read, Write};

use age::secrecy::SecretString;
use tracing::{debug, instrument};

use caviard_core::error::{CaviardError, Result};

/// Passphrase-protected wrapping for exported documents.
///
/// Stateless per call — the passphrase lives only as long as this value, so
/// callers can drop it promptly after use.
pub struct ProtectedExport {
    passphrase: SecretString,
}

impl ProtectedExport {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: SecretString::from(passphrase.into()),
        }
    }

    /// Wrap finished document bytes in an age envelope.
    ///
    /// The output is a complete age file (header + encrypted payload),
    /// conventionally written next to the input as `<name>.pdf.age`.
    #[instrument(skip_all, fields(document_len = document.len()))]
    pub fn seal(&self, document: &[u8]) -> Result<Vec<u8>> {
        let encryptor = age::Encryptor::with_user_passphrase(self.passphrase.clone());
        let mut sealed = Vec::new();

        let mut writer = encryptor
            .wrap_output(&mut sealed)
            .map_err(|e| CaviardError::Encryption(e.to_string()))?;
        writer
            .write_all(document)
            .map_err(|e| CaviardError::Encryption(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| CaviardError::Encryption(e.to_string()))?;

        debug!(sealed_len = sealed.len(), "export sealed");
        Ok(sealed)
    }

    /// Unwrap an age file produced by [`seal`](Self::seal), returning the
    /// original document bytes.
    #[instrument(skip_all, fields(sealed_len = sealed.len()))]
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        let decryptor =
            age::Decryptor::new(sealed).map_err(|e| CaviardError::Crypto(e.to_string()))?;

        let identity = age::scrypt::Identity::new(self.passphrase.clone());

        let mut reader = decryptor
            .decrypt(std::iter::once(&identity as &dyn age::Identity))
            .map_err(|e| CaviardError::Crypto(e.to_string()))?;

        let mut document = Vec::new();
        reader
            .read_to_end(&mut document)
            .map_err(|e| CaviardError::Crypto(e.to_string()))?;

        debug!(document_len = document.len(), "export opened");
        Ok(document)
    }
}
