// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hybrid envelope cipher — RSA-OAEP(SHA-256) wraps a fresh AES-256 session
// key; AES-256-GCM authenticated-encrypts the payload. The result is a
// self-contained blob, base64-encoded so it can live in text-typed
// annotation fields.
//
// Blob layout (big-endian, offsets in bytes):
//
//   0           : uint16 key_len
//   2           : key_len bytes  wrapped_session_key
//   2+key_len   : 12 bytes       nonce
//   14+key_len  : 16 bytes       auth_tag
//   30+key_len  : remainder      ciphertext
//
// Confidentiality rests solely on private-key secrecy; there is no recovery
// path if the private key is lost. Every escrow gets an independent session
// key, so one compromised escrow exposes nothing else.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use rand::rngs::OsRng;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use tracing::{debug, instrument};
use zeroize::Zeroizing;

use caviard_core::error::{CaviardError, Result};

/// Length of the big-endian wrapped-key length prefix.
const KEY_LEN_FIELD: usize = 2;
/// AES-GCM nonce length (96 bits).
const NONCE_LEN: usize = 12;
/// AES-GCM authentication tag length (128 bits).
const TAG_LEN: usize = 16;
/// Total fixed header: length prefix + nonce + tag. Anything shorter cannot
/// be a valid blob.
pub const FIXED_HEADER_LEN: usize = KEY_LEN_FIELD + NONCE_LEN + TAG_LEN;

/// Encrypt `plaintext` for the holder of the private half of `public_key`.
///
/// A fresh 256-bit session key and 96-bit nonce are drawn from the OS RNG on
/// every call — session keys are never reused across escrows. Returns the
/// base64-encoded blob ready for embedding in an annotation.
#[instrument(skip_all, fields(plaintext_len = plaintext.len()))]
pub fn encrypt(public_key: &RsaPublicKey, plaintext: &[u8]) -> Result<String> {
    let mut session = [0u8; 32];
    OsRng.fill_bytes(&mut session);
    let session = Zeroizing::new(session);

    let wrapped = public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &session[..])
        .map_err(|e| CaviardError::Encryption(format!("session key wrap failed: {e}")))?;
    let key_len = u16::try_from(wrapped.len()).map_err(|_| {
        CaviardError::Encryption(format!(
            "wrapped session key is {} bytes, exceeding the u16 length prefix",
            wrapped.len()
        ))
    })?;

    let cipher = Aes256Gcm::new_from_slice(&session[..])
        .map_err(|e| CaviardError::Encryption(format!("session key rejected: {e}")))?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    // The aead crate appends the 16-byte tag to the ciphertext; the blob
    // layout carries the tag before the ciphertext, so split it back off.
    let mut ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| CaviardError::Encryption("AEAD encryption failed".to_string()))?;
    let tag = ciphertext.split_off(ciphertext.len() - TAG_LEN);

    let mut blob = Vec::with_capacity(FIXED_HEADER_LEN + wrapped.len() + ciphertext.len());
    blob.extend_from_slice(&key_len.to_be_bytes());
    blob.extend_from_slice(&wrapped);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&tag);
    blob.extend_from_slice(&ciphertext);

    debug!(blob_len = blob.len(), "envelope sealed");
    Ok(BASE64.encode(blob))
}

/// Decrypt a base64 blob produced by [`encrypt`].
///
/// Fails with `Format` on malformed base64 or a blob shorter than its
/// header, `Crypto` when the session key cannot be unwrapped (wrong private
/// key or corrupted wrap), and `Authentication` when tag verification fails.
/// No plaintext is ever released on a failure path.
#[instrument(skip_all, fields(blob_len = blob_text.len()))]
pub fn decrypt(private_key: &RsaPrivateKey, blob_text: &str) -> Result<Vec<u8>> {
    let blob = BASE64
        .decode(blob_text.trim().as_bytes())
        .map_err(|e| CaviardError::Format(format!("invalid base64: {e}")))?;

    if blob.len() < FIXED_HEADER_LEN {
        return Err(CaviardError::Format(format!(
            "blob is {} bytes, shorter than the {FIXED_HEADER_LEN}-byte fixed header",
            blob.len()
        )));
    }

    let key_len = u16::from_be_bytes([blob[0], blob[1]]) as usize;
    if blob.len() < FIXED_HEADER_LEN + key_len {
        return Err(CaviardError::Format(format!(
            "blob truncated: header promises a {key_len}-byte wrapped key, {} bytes present",
            blob.len() - KEY_LEN_FIELD
        )));
    }

    let wrapped = &blob[KEY_LEN_FIELD..KEY_LEN_FIELD + key_len];
    let nonce = &blob[KEY_LEN_FIELD + key_len..KEY_LEN_FIELD + key_len + NONCE_LEN];
    let tag = &blob[KEY_LEN_FIELD + key_len + NONCE_LEN..FIXED_HEADER_LEN + key_len];
    let ciphertext = &blob[FIXED_HEADER_LEN + key_len..];

    let session = Zeroizing::new(
        private_key
            .decrypt(Oaep::new::<Sha256>(), wrapped)
            .map_err(|e| CaviardError::Crypto(format!("OAEP unwrap failed: {e}")))?,
    );
    let cipher = Aes256Gcm::new_from_slice(&session[..])
        .map_err(|_| CaviardError::Crypto("unwrapped session key has invalid length".to_string()))?;

    // Reassemble ciphertext ++ tag for the aead crate; verification happens
    // before a single plaintext byte is exposed.
    let mut combined = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), combined.as_slice())
        .map_err(|_| {
            CaviardError::Authentication(
                "tag verification failed (tampered blob or wrong key)".to_string(),
            )
        })?;

    debug!(plaintext_len = plaintext.len(), "envelope opened");
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    /// RSA keypairs are expensive to generate, so the suite shares two.
    fn keypair() -> &'static (RsaPrivateKey, RsaPublicKey) {
        static KEYS: OnceLock<(RsaPrivateKey, RsaPublicKey)> = OnceLock::new();
        KEYS.get_or_init(|| crate::keys::generate_keypair(2048).expect("keygen failed"))
    }

    fn other_keypair() -> &'static (RsaPrivateKey, RsaPublicKey) {
        static KEYS: OnceLock<(RsaPrivateKey, RsaPublicKey)> = OnceLock::new();
        KEYS.get_or_init(|| crate::keys::generate_keypair(2048).expect("keygen failed"))
    }

    #[test]
    fn round_trip() {
        let (private_key, public_key) = keypair();
        let plaintext = b"escrowed page fragment \x00\x01\xff";

        let blob = encrypt(public_key, plaintext).expect("encrypt failed");
        let recovered = decrypt(private_key, &blob).expect("decrypt failed");
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn empty_plaintext_round_trip() {
        let (private_key, public_key) = keypair();
        let blob = encrypt(public_key, b"").expect("encrypt failed");
        let recovered = decrypt(private_key, &blob).expect("decrypt failed");
        assert!(recovered.is_empty());
    }

    #[test]
    fn session_keys_are_independent() {
        let (_, public_key) = keypair();
        let first = encrypt(public_key, b"same plaintext").unwrap();
        let second = encrypt(public_key, b"same plaintext").unwrap();
        // Fresh session key and nonce per call — identical input must not
        // produce identical blobs.
        assert_ne!(first, second);
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let (private_key, public_key) = keypair();
        let blob = encrypt(public_key, b"tamper target payload").unwrap();

        let mut raw = BASE64.decode(blob.as_bytes()).unwrap();
        let last = raw.len() - 1; // final ciphertext byte
        raw[last] ^= 0x01;
        let tampered = BASE64.encode(&raw);

        let result = decrypt(private_key, &tampered);
        assert!(matches!(result, Err(CaviardError::Authentication(_))));
    }

    #[test]
    fn tampered_tag_fails_authentication() {
        let (private_key, public_key) = keypair();
        let blob = encrypt(public_key, b"tamper target payload").unwrap();

        let mut raw = BASE64.decode(blob.as_bytes()).unwrap();
        let key_len = u16::from_be_bytes([raw[0], raw[1]]) as usize;
        let tag_offset = 2 + key_len + 12;
        raw[tag_offset] ^= 0x80;
        let tampered = BASE64.encode(&raw);

        let result = decrypt(private_key, &tampered);
        assert!(matches!(result, Err(CaviardError::Authentication(_))));
    }

    #[test]
    fn short_blob_fails_format() {
        let (private_key, _) = keypair();
        let short = BASE64.encode([0u8; FIXED_HEADER_LEN - 1]);
        let result = decrypt(private_key, &short);
        assert!(matches!(result, Err(CaviardError::Format(_))));
    }

    #[test]
    fn truncated_wrapped_key_fails_format() {
        let (private_key, _) = keypair();
        // Header promises a 256-byte wrapped key but the blob ends early.
        let mut raw = vec![0x01, 0x00];
        raw.extend_from_slice(&[0u8; 40]);
        let result = decrypt(private_key, &BASE64.encode(&raw));
        assert!(matches!(result, Err(CaviardError::Format(_))));
    }

    #[test]
    fn garbage_base64_fails_format() {
        let (private_key, _) = keypair();
        let result = decrypt(private_key, "not//valid==base64!!");
        assert!(matches!(result, Err(CaviardError::Format(_))));
    }

    #[test]
    fn wrong_private_key_fails_before_plaintext() {
        let (_, public_key) = keypair();
        let (wrong_private, _) = other_keypair();

        let blob = encrypt(public_key, b"for someone else").unwrap();
        let result = decrypt(wrong_private, &blob);
        assert!(matches!(result, Err(CaviardError::Crypto(_))));
    }
}
