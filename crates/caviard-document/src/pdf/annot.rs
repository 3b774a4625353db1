// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Escrow annotation construction and recognition.
//
// An escrow rides inside the output document as a text annotation whose
// title (/T) equals the discriminator constant and whose /Contents field
// holds the base64 envelope blob. The annotation is rendered at zero opacity
// and flagged hidden — if it ever drew itself it would defeat the redaction
// sitting underneath it.

use lopdf::{Dictionary, Object, StringFormat};
use uuid::Uuid;

use caviard_core::types::ESCROW_DISCRIMINATOR;

/// Side of the square anchor rect hanging off the region's top-left corner,
/// in document units. Invisible either way; some viewers want a non-empty
/// /Rect to keep the annotation addressable.
const ANCHOR_SIZE: f64 = 12.0;

/// Build the escrow annotation dictionary.
///
/// `anchor_x` / `anchor_y` are the region's top-left corner already flipped
/// into PDF user space (y up). Returns the dictionary and the fresh /NM
/// annotation name identifying this escrow.
pub fn build_escrow_annotation(blob: &str, anchor_x: f64, anchor_y: f64) -> (Dictionary, String) {
    let name = Uuid::new_v4().to_string();

    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(b"Text".to_vec()));
    annot.set(
        "Rect",
        Object::Array(vec![
            Object::Real(anchor_x as f32),
            Object::Real((anchor_y - ANCHOR_SIZE) as f32),
            Object::Real((anchor_x + ANCHOR_SIZE) as f32),
            Object::Real(anchor_y as f32),
        ]),
    );
    annot.set(
        "T",
        Object::String(
            ESCROW_DISCRIMINATOR.as_bytes().to_vec(),
            StringFormat::Literal,
        ),
    );
    annot.set(
        "Contents",
        Object::String(blob.as_bytes().to_vec(), StringFormat::Literal),
    );
    annot.set(
        "NM",
        Object::String(name.as_bytes().to_vec(), StringFormat::Literal),
    );
    // Zero opacity plus the Hidden flag — never rendered, never printed.
    annot.set("CA", Object::Real(0.0));
    annot.set("F", Object::Integer(2));

    (annot, name)
}

/// If `dict` is an escrow annotation, return its blob text.
///
/// Recognition is by the /T discriminator; any other annotation (including
/// foreign text annotations) is ignored by the restore scan.
pub fn escrow_blob(dict: &Dictionary) -> Option<String> {
    let title = dict.get(b"T").ok()?;
    let Object::String(title_bytes, _) = title else {
        return None;
    };
    if title_bytes.as_slice() != ESCROW_DISCRIMINATOR.as_bytes() {
        return None;
    }

    let contents = dict.get(b"Contents").ok()?;
    let Object::String(blob_bytes, _) = contents else {
        return None;
    };
    String::from_utf8(blob_bytes.clone()).ok()
}
