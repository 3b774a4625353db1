// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Key material handling — PEM-encoded RSA keys supplied externally.
//
// The core loads keys per operation and never writes key material to disk;
// only the CLI's keygen command (a caller) persists freshly generated pairs.
// Both PKCS#8 ("BEGIN PUBLIC/PRIVATE KEY") and the older PKCS#1
// ("BEGIN RSA ...") encodings are accepted on load.

use std::path::Path;

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::{debug, info, instrument};
use zeroize::Zeroizing;

use caviard_core::error::{CaviardError, Result};

/// Generate a fresh RSA keypair of the given modulus size.
#[instrument]
pub fn generate_keypair(bits: usize) -> Result<(RsaPrivateKey, RsaPublicKey)> {
    info!(bits, "generating escrow keypair");
    let private_key = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| CaviardError::Key(format!("keypair generation failed: {e}")))?;
    let public_key = private_key.to_public_key();
    Ok((private_key, public_key))
}

/// Parse a public key from PEM text, accepting PKCS#8 or PKCS#1 encodings.
pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| CaviardError::Key(format!("unreadable public key PEM: {e}")))
}

/// Parse a private key from PEM text, accepting PKCS#8 or PKCS#1 encodings.
pub fn private_key_from_pem(pem: &str) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| CaviardError::Key(format!("unreadable private key PEM: {e}")))
}

/// Load a public key from a PEM file.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_public_key(path: impl AsRef<Path>) -> Result<RsaPublicKey> {
    let pem = std::fs::read_to_string(path.as_ref())?;
    let key = public_key_from_pem(&pem)?;
    debug!("public key loaded");
    Ok(key)
}

/// Load a private key from a PEM file.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_private_key(path: impl AsRef<Path>) -> Result<RsaPrivateKey> {
    let pem = Zeroizing::new(std::fs::read_to_string(path.as_ref())?);
    let key = private_key_from_pem(&pem)?;
    debug!("private key loaded");
    Ok(key)
}

/// Encode a public key as PKCS#8 PEM text.
pub fn public_key_to_pem(key: &RsaPublicKey) -> Result<String> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| CaviardError::Key(format!("public key encoding failed: {e}")))
}

/// Encode a private key as PKCS#8 PEM text, zeroized on drop.
pub fn private_key_to_pem(key: &RsaPrivateKey) -> Result<Zeroizing<String>> {
    key.to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| CaviardError::Key(format!("private key encoding failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_pair_round_trips_through_pem() {
        let (private_key, public_key) = generate_keypair(2048).unwrap();

        let public_pem = public_key_to_pem(&public_key).unwrap();
        let private_pem = private_key_to_pem(&private_key).unwrap();

        assert!(public_pem.contains("BEGIN PUBLIC KEY"));
        assert!(private_pem.contains("BEGIN PRIVATE KEY"));

        assert_eq!(public_key_from_pem(&public_pem).unwrap(), public_key);
        assert_eq!(private_key_from_pem(&private_pem).unwrap(), private_key);
    }

    #[test]
    fn load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let (private_key, public_key) = generate_keypair(2048).unwrap();

        let pub_path = dir.path().join("escrow.pub.pem");
        let priv_path = dir.path().join("escrow.key.pem");
        std::fs::write(&pub_path, public_key_to_pem(&public_key).unwrap()).unwrap();
        std::fs::write(&priv_path, private_key_to_pem(&private_key).unwrap().as_str()).unwrap();

        assert_eq!(load_public_key(&pub_path).unwrap(), public_key);
        assert_eq!(load_private_key(&priv_path).unwrap(), private_key);
    }

    #[test]
    fn rejects_garbage_pem() {
        assert!(matches!(
            public_key_from_pem("-----BEGIN NONSENSE-----\nAAAA\n-----END NONSENSE-----\n"),
            Err(CaviardError::Key(_))
        ));
        assert!(matches!(
            private_key_from_pem("not pem at all"),
            Err(CaviardError::Key(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load_public_key("/nonexistent/escrow.pub.pem");
        assert!(matches!(result, Err(CaviardError::Io(_))));
    }
}
