// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Caviard.

use thiserror::Error;

/// Top-level error type for all Caviard operations.
#[derive(Debug, Error)]
pub enum CaviardError {
    // -- Escrow envelope errors --
    /// Malformed envelope blob: bad base64, or shorter than the fixed header.
    #[error("malformed envelope blob: {0}")]
    Format(String),

    /// Session-key unwrap failed (wrong private key or corrupted wrap).
    #[error("session key unwrap failed: {0}")]
    Crypto(String),

    /// AEAD tag verification failed — the blob was tampered with, or the
    /// session key is wrong. No plaintext is released on this path.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Payload decoded from a valid envelope is not a well-formed escrow
    /// payload (missing field, non-numeric rect).
    #[error("escrow payload decode failed: {0}")]
    Decode(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    // -- Geometry errors --
    /// Degenerate polygon input (fewer than 3 vertices).
    #[error("invalid geometry: {0}")]
    Geometry(String),

    // -- Key material --
    #[error("key material error: {0}")]
    Key(String),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("image processing failed: {0}")]
    Image(String),

    // -- Integrity / audit --
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    #[error("database error: {0}")]
    Database(String),

    // -- Control flow --
    /// A multi-page operation was cancelled between pages; partial output
    /// has been discarded.
    #[error("operation cancelled")]
    Cancelled,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CaviardError>;
