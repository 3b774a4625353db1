// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redacted document wrapper — opens, inspects, and mutates the output PDF
// using the `lopdf` crate: opaque fills painted into page content, escrow
// annotations attached and scanned, recovered snapshots overlaid.
//
// Document-space regions arrive with the preview's orientation (origin
// top-left, y down); PDF user space is y-up, so every rect is flipped
// against the page height here and nowhere else.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, instrument, warn};

use caviard_core::error::{CaviardError, Result};
use caviard_core::types::{DocumentRegion, PageSize};

use super::annot;

fn pdf_err(err: lopdf::Error) -> CaviardError {
    CaviardError::Pdf(err.to_string())
}

/// A PDF document being redacted or restored.
///
/// Wraps `lopdf::Document` with the operations the apply/restore pipeline
/// needs. The wrapper is the single append-only output accumulator of a
/// multi-page operation; nothing else mutates the document.
#[derive(Clone)]
pub struct RedactedDocument {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
    /// Counter feeding unique XObject resource names for overlays.
    overlay_counter: u32,
}

impl RedactedDocument {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            CaviardError::Pdf(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
            overlay_counter: 0,
        })
    }

    /// Create a wrapper from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| CaviardError::Pdf(format!("failed to load PDF from memory: {err}")))?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
            overlay_counter: 0,
        })
    }

    /// Wrap an already-built lopdf document.
    pub fn from_document(document: Document) -> Self {
        Self {
            document,
            source_path: None,
            overlay_counter: 0,
        }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Page numbers and object ids in document order (1-indexed numbers).
    pub fn pages(&self) -> Vec<(u32, ObjectId)> {
        self.document.get_pages().into_iter().collect()
    }

    /// Object id of a 1-indexed page.
    pub fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        self.document
            .get_pages()
            .get(&page_number)
            .copied()
            .ok_or_else(|| {
                CaviardError::Pdf(format!(
                    "page {} out of range (document has {} pages)",
                    page_number,
                    self.page_count()
                ))
            })
    }

    /// Return the source path if the document was opened from a file.
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Physical page dimensions from /MediaBox, following /Parent
    /// inheritance when the page dictionary does not carry its own.
    pub fn page_size(&self, page_id: ObjectId) -> Result<PageSize> {
        let mut current = page_id;
        for _ in 0..16 {
            let dict = self.dict_at(current)?;
            if let Ok(media_box) = dict.get(b"MediaBox") {
                return parse_media_box(self.resolve(media_box));
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => current = *parent,
                _ => break,
            }
        }
        Err(CaviardError::Pdf(format!(
            "page {page_id:?} has no MediaBox anywhere in its parent chain"
        )))
    }

    /// Machine-readable text of a 1-indexed page.
    pub fn extract_page_text(&self, page_number: u32) -> Result<String> {
        self.document
            .extract_text(&[page_number])
            .map_err(|err| CaviardError::Pdf(format!("text extraction failed: {err}")))
    }

    // -- Opaque fills ---------------------------------------------------------

    /// Paint opaque rectangles over `rects` on a page. Irreversible on its
    /// own — whatever sat under the rectangles is covered in the rendered
    /// output from here on.
    ///
    /// Returns the number of rectangles painted.
    #[instrument(skip_all, fields(rects = rects.len()))]
    pub fn paint_fill(
        &mut self,
        page_id: ObjectId,
        rects: &[DocumentRegion],
        color: [f32; 3],
    ) -> Result<usize> {
        if rects.is_empty() {
            return Ok(0);
        }
        let page = self.page_size(page_id)?;

        let mut ops = Vec::with_capacity(rects.len() + 4);
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "rg",
            vec![
                Object::Real(color[0]),
                Object::Real(color[1]),
                Object::Real(color[2]),
            ],
        ));
        for rect in rects {
            ops.push(Operation::new(
                "re",
                vec![
                    Object::Real(rect.x0 as f32),
                    Object::Real((page.height - rect.y1) as f32),
                    Object::Real(rect.width() as f32),
                    Object::Real(rect.height() as f32),
                ],
            ));
        }
        ops.push(Operation::new("f", vec![]));
        ops.push(Operation::new("Q", vec![]));

        self.append_operations(page_id, ops)?;
        debug!("opaque fill painted");
        Ok(rects.len())
    }

    // -- Escrow annotations ---------------------------------------------------

    /// Attach an escrow annotation carrying `blob`, anchored at the region's
    /// top-left corner. Returns the fresh annotation name.
    #[instrument(skip_all)]
    pub fn attach_escrow(
        &mut self,
        page_id: ObjectId,
        region: &DocumentRegion,
        blob: &str,
    ) -> Result<String> {
        let page = self.page_size(page_id)?;
        let (annotation, name) =
            annot::build_escrow_annotation(blob, region.x0, page.height - region.y0);

        let annot_id = self.document.add_object(Object::Dictionary(annotation));
        let mut annots = self.read_annots(page_id)?;
        annots.push(Object::Reference(annot_id));
        self.write_annots(page_id, annots)?;

        debug!(%name, "escrow annotation attached");
        Ok(name)
    }

    /// Escrow blobs on a page, as `(index within /Annots, blob text)` pairs.
    /// Foreign annotations are skipped.
    pub fn escrow_annotations(&self, page_id: ObjectId) -> Result<Vec<(usize, String)>> {
        let annots = self.read_annots(page_id)?;
        let mut found = Vec::new();
        for (index, entry) in annots.iter().enumerate() {
            let dict = match entry {
                Object::Dictionary(dict) => dict,
                Object::Reference(id) => match self.document.get_object(*id) {
                    Ok(Object::Dictionary(dict)) => dict,
                    _ => {
                        warn!(?id, "unresolvable annotation reference, skipping");
                        continue;
                    }
                },
                _ => continue,
            };
            if let Some(blob) = annot::escrow_blob(dict) {
                found.push((index, blob));
            }
        }
        Ok(found)
    }

    /// Remove annotations by their index within the page's /Annots array.
    pub fn remove_annotations(&mut self, page_id: ObjectId, indices: &[usize]) -> Result<()> {
        if indices.is_empty() {
            return Ok(());
        }
        let annots = self.read_annots(page_id)?;
        let kept: Vec<Object> = annots
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !indices.contains(i))
            .map(|(_, obj)| obj)
            .collect();
        self.write_annots(page_id, kept)
    }

    // -- Snapshot overlay -----------------------------------------------------

    /// Place a recovered PNG snapshot over `region`, above all existing
    /// page content.
    #[instrument(skip_all, fields(png_len = png.len()))]
    pub fn overlay_snapshot(
        &mut self,
        page_id: ObjectId,
        region: &DocumentRegion,
        png: &[u8],
    ) -> Result<()> {
        let page = self.page_size(page_id)?;

        let decoded = image::load_from_memory(png)
            .map_err(|err| CaviardError::Image(format!("snapshot decode failed: {err}")))?;
        let rgb = decoded.to_rgb8();
        let (width_px, height_px) = (rgb.width(), rgb.height());

        let mut image_dict = Dictionary::new();
        image_dict.set("Type", Object::Name(b"XObject".to_vec()));
        image_dict.set("Subtype", Object::Name(b"Image".to_vec()));
        image_dict.set("Width", Object::Integer(width_px as i64));
        image_dict.set("Height", Object::Integer(height_px as i64));
        image_dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        image_dict.set("BitsPerComponent", Object::Integer(8));
        let stream = Stream::new(image_dict, rgb.into_raw());

        self.overlay_counter += 1;
        let base_name = format!("CavIm{}", self.overlay_counter);
        let resource_name = self.add_xobject(page_id, base_name, stream)?;

        let ops = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(region.width() as f32),
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(region.height() as f32),
                    Object::Real(region.x0 as f32),
                    Object::Real((page.height - region.y1) as f32),
                ],
            ),
            Operation::new("Do", vec![Object::Name(resource_name.into_bytes())]),
            Operation::new("Q", vec![]),
        ];
        self.append_operations(page_id, ops)?;
        debug!(width_px, height_px, "snapshot overlaid");
        Ok(())
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise the document to bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|err| CaviardError::Pdf(format!("failed to serialise PDF: {err}")))?;
        Ok(output)
    }

    /// Write the document to a file.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote PDF to {}", path.as_ref().display());
        Ok(())
    }

    // -- Helpers --------------------------------------------------------------

    fn dict_at(&self, id: ObjectId) -> Result<&Dictionary> {
        self.document
            .get_object(id)
            .map_err(pdf_err)?
            .as_dict()
            .map_err(pdf_err)
    }

    /// Follow a single reference hop, returning the target object.
    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.document.get_object(*id).unwrap_or(object),
            other => other,
        }
    }

    /// Append `operations` to a page's content, isolating them from any
    /// unbalanced graphics state the existing content may leave behind: the
    /// existing streams are bracketed by a fresh `q` before and `Q` after.
    fn append_operations(&mut self, page_id: ObjectId, operations: Vec<Operation>) -> Result<()> {
        let prefix = Content {
            operations: vec![Operation::new("q", vec![])],
        };
        let mut suffix_ops = vec![Operation::new("Q", vec![])];
        suffix_ops.extend(operations);
        let suffix = Content {
            operations: suffix_ops,
        };

        let prefix_bytes = prefix.encode().map_err(pdf_err)?;
        let suffix_bytes = suffix.encode().map_err(pdf_err)?;
        let prefix_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), prefix_bytes));
        let suffix_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), suffix_bytes));

        let existing: Vec<Object> = match self.dict_at(page_id)?.get(b"Contents") {
            Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
            Ok(Object::Array(array)) => array.clone(),
            _ => Vec::new(),
        };

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(prefix_id));
        contents.extend(existing);
        contents.push(Object::Reference(suffix_id));

        if let Ok(Object::Dictionary(dict)) = self.document.get_object_mut(page_id) {
            dict.set("Contents", Object::Array(contents));
        }
        Ok(())
    }

    /// The page's /Annots entries as an owned vector (empty when absent).
    fn read_annots(&self, page_id: ObjectId) -> Result<Vec<Object>> {
        match self.dict_at(page_id)?.get(b"Annots") {
            Ok(Object::Array(array)) => Ok(array.clone()),
            Ok(Object::Reference(id)) => match self.document.get_object(*id) {
                Ok(Object::Array(array)) => Ok(array.clone()),
                _ => Ok(Vec::new()),
            },
            _ => Ok(Vec::new()),
        }
    }

    /// Write the page's /Annots as a direct array (an indirect array from
    /// the source document is replaced — legal, and simpler than patching
    /// the shared object).
    fn write_annots(&mut self, page_id: ObjectId, annots: Vec<Object>) -> Result<()> {
        if let Ok(Object::Dictionary(dict)) = self.document.get_object_mut(page_id) {
            dict.set("Annots", Object::Array(annots));
            Ok(())
        } else {
            Err(CaviardError::Pdf(format!(
                "page {page_id:?} is not a dictionary"
            )))
        }
    }

    /// Register an image XObject in the page's resources under a unique
    /// name derived from `base_name`, returning the name actually used.
    ///
    /// Inherited resources are resolved from the parent chain and written
    /// back as a direct dictionary so fonts and other entries survive.
    fn add_xobject(
        &mut self,
        page_id: ObjectId,
        base_name: String,
        stream: Stream,
    ) -> Result<String> {
        let image_id = self.document.add_object(stream);

        let mut resources = self.resolved_resources(page_id)?;
        let mut xobjects = match resources.get(b"XObject") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(id)) => match self.document.get_object(*id) {
                Ok(Object::Dictionary(dict)) => dict.clone(),
                _ => Dictionary::new(),
            },
            _ => Dictionary::new(),
        };

        let mut name = base_name;
        while xobjects.has(name.as_bytes()) {
            self.overlay_counter += 1;
            name = format!("CavIm{}", self.overlay_counter);
        }
        xobjects.set(name.clone(), Object::Reference(image_id));
        resources.set("XObject", Object::Dictionary(xobjects));

        if let Ok(Object::Dictionary(dict)) = self.document.get_object_mut(page_id) {
            dict.set("Resources", Object::Dictionary(resources));
        }
        Ok(name)
    }

    /// The page's effective /Resources dictionary, following /Parent
    /// inheritance. Empty when no ancestor carries one.
    fn resolved_resources(&self, page_id: ObjectId) -> Result<Dictionary> {
        let mut current = page_id;
        for _ in 0..16 {
            let dict = self.dict_at(current)?;
            if let Ok(resources) = dict.get(b"Resources") {
                if let Object::Dictionary(direct) = self.resolve(resources) {
                    return Ok(direct.clone());
                }
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => current = *parent,
                _ => break,
            }
        }
        Ok(Dictionary::new())
    }
}

/// Parse a /MediaBox array into page dimensions.
fn parse_media_box(object: &Object) -> Result<PageSize> {
    let array = object
        .as_array()
        .map_err(|_| CaviardError::Pdf("MediaBox is not an array".to_string()))?;
    if array.len() != 4 {
        return Err(CaviardError::Pdf(format!(
            "MediaBox has {} entries, expected 4",
            array.len()
        )));
    }
    let mut coords = [0.0f64; 4];
    for (slot, entry) in coords.iter_mut().zip(array) {
        *slot = to_f64(entry).ok_or_else(|| {
            CaviardError::Pdf("MediaBox contains a non-numeric entry".to_string())
        })?;
    }
    Ok(PageSize {
        width: coords[2] - coords[0],
        height: coords[3] - coords[1],
    })
}

fn to_f64(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(*value as f64),
        _ => None,
    }
}
