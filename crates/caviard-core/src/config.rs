// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redaction engine configuration.

use serde::{Deserialize, Serialize};

/// Tunable settings for the apply/restore pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    /// Scanline band height for polygon decomposition, in document units
    /// (PDF points). 4.0 pt ≈ 1.4 mm. Smaller steps trace the outline more
    /// faithfully at the cost of more rectangles.
    pub scanline_step: f64,
    /// RGB fill colour painted over redacted rectangles (0.0–1.0 per channel).
    pub fill_color: [f32; 3],
    /// RSA modulus size in bits for freshly generated escrow keypairs.
    pub escrow_key_bits: usize,
    /// Record apply/restore operations in the audit trail.
    pub audit_enabled: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            scanline_step: 4.0,
            fill_color: [0.0, 0.0, 0.0],
            escrow_key_bits: 2048,
            audit_enabled: true,
        }
    }
}
