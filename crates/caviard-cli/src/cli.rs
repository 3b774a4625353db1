// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "caviard")]
#[command(about = "Reversible PDF redaction with key-escrowed recovery", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a fresh RSA escrow keypair as PEM files
    Keygen(KeygenArgs),

    /// Redact regions of a PDF, optionally escrowing the covered content
    Apply(ApplyArgs),

    /// Restore escrowed content back into the document as image overlays
    Restore(RestoreArgs),

    /// Extract escrowed text into a recovery report PDF
    RestoreText(RestoreTextArgs),

    /// Wrap a finished document in a passphrase-protected envelope
    Protect(ProtectArgs),

    /// Unwrap a passphrase-protected document
    Unprotect(ProtectArgs),

    /// Show recent entries from the audit trail
    Audit(AuditArgs),
}

#[derive(Args)]
pub struct KeygenArgs {
    /// Where to write the public key PEM
    #[arg(long, default_value = "escrow.pub.pem")]
    pub public: PathBuf,

    /// Where to write the private key PEM
    #[arg(long, default_value = "escrow.key.pem")]
    pub private: PathBuf,

    /// RSA modulus size in bits
    #[arg(long, default_value_t = 2048)]
    pub bits: usize,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Input PDF
    pub input: PathBuf,

    /// Output PDF
    #[arg(short, long)]
    pub output: PathBuf,

    /// Region file (JSON): pages, raster dimensions, regions, previews
    #[arg(short, long)]
    pub regions: PathBuf,

    /// Public key PEM enabling escrow; omit for irreversible redaction
    #[arg(long)]
    pub public_key: Option<PathBuf>,

    /// Scanline step for polygon decomposition, in document units
    #[arg(long)]
    pub step: Option<f64>,

    /// Write blacked-out preview rasters next to each supplied preview
    #[arg(long)]
    pub emit_previews: bool,

    /// Record the operation in this audit database
    #[arg(long)]
    pub audit_db: Option<PathBuf>,
}

#[derive(Args)]
pub struct RestoreArgs {
    /// Input PDF containing escrow annotations
    pub input: PathBuf,

    /// Output PDF with recovered content overlaid
    #[arg(short, long)]
    pub output: PathBuf,

    /// Private key PEM
    #[arg(long)]
    pub private_key: PathBuf,

    /// Record the operation in this audit database
    #[arg(long)]
    pub audit_db: Option<PathBuf>,
}

#[derive(Args)]
pub struct RestoreTextArgs {
    /// Input PDF containing escrow annotations
    pub input: PathBuf,

    /// Output report PDF
    #[arg(short, long)]
    pub output: PathBuf,

    /// Private key PEM
    #[arg(long)]
    pub private_key: PathBuf,
}

#[derive(Args)]
pub struct ProtectArgs {
    /// Input file
    pub input: PathBuf,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Passphrase for the age envelope
    #[arg(long)]
    pub passphrase: String,
}

#[derive(Args)]
pub struct AuditArgs {
    /// Audit database path
    #[arg(long, default_value = "caviard-audit.db")]
    pub db: PathBuf,

    /// Number of entries to show, newest first
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}
