// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recovery report writer — renders the output of a text-extraction restore
// into a standalone PDF using `printpdf` 0.8: one header per recovered
// escrow followed by its text, with a scan summary up top.

use std::path::Path;

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use tracing::{debug, info, instrument};

use caviard_core::error::Result;
use caviard_core::types::{RecoveredText, RestoreReport};

const PAGE_W_MM: f32 = 210.0;
const PAGE_H_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const BODY_SIZE_PT: f32 = 11.0;
const HEADER_SIZE_PT: f32 = 12.0;
const LINE_HEIGHT_PT: f32 = 14.0;

/// One laid-out line of the report, before pagination.
struct ReportLine {
    text: String,
    bold: bool,
}

/// Renders recovered-text entries into a text-dump PDF.
pub struct RecoveryReportWriter {
    /// Title embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl RecoveryReportWriter {
    pub fn new() -> Self {
        Self { title: None }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Render the report to PDF bytes.
    #[instrument(skip_all, fields(entries = entries.len()))]
    pub fn render(&self, entries: &[RecoveredText], report: &RestoreReport) -> Result<Vec<u8>> {
        let title = self.title.as_deref().unwrap_or("Caviard Recovery Report");

        // Approximate Helvetica glyph width at 11pt, in mm (1pt = 0.3528mm).
        let avg_char_width_mm: f32 = 0.50 * BODY_SIZE_PT * 0.3528;
        let usable_width_mm = PAGE_W_MM - 2.0 * MARGIN_MM;
        let max_chars = (usable_width_mm / avg_char_width_mm) as usize;

        let mut lines: Vec<ReportLine> = Vec::new();
        lines.push(ReportLine {
            text: title.to_string(),
            bold: true,
        });
        lines.push(ReportLine {
            text: format!(
                "{} pages scanned, {} escrows recovered, {} failed",
                report.pages_processed, report.escrows_recovered, report.escrows_failed
            ),
            bold: false,
        });
        lines.push(ReportLine {
            text: String::new(),
            bold: false,
        });

        for entry in entries {
            lines.push(ReportLine {
                text: format!(
                    "Page {} - region ({:.1}, {:.1}) to ({:.1}, {:.1})",
                    entry.page,
                    entry.region.x0,
                    entry.region.y0,
                    entry.region.x1,
                    entry.region.y1
                ),
                bold: true,
            });
            for wrapped in wrap(&entry.text, max_chars) {
                lines.push(ReportLine {
                    text: wrapped,
                    bold: false,
                });
            }
            lines.push(ReportLine {
                text: String::new(),
                bold: false,
            });
        }

        info!(title, total_lines = lines.len(), "rendering recovery report");
        Ok(paginate(title, &lines))
    }

    /// Render the report and write it to a file.
    pub fn write_to_file(
        &self,
        entries: &[RecoveredText],
        report: &RestoreReport,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let bytes = self.render(entries, report)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote recovery report to {}", path.as_ref().display());
        Ok(())
    }
}

impl Default for RecoveryReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Flow `lines` onto A4 pages, top to bottom.
fn paginate(title: &str, lines: &[ReportLine]) -> Vec<u8> {
    let page_w = Mm(PAGE_W_MM);
    let page_h = Mm(PAGE_H_MM);
    let margin_pt = Mm(MARGIN_MM).into_pt().0;
    let page_h_pt = page_h.into_pt().0;
    let usable_height_pt = page_h_pt - 2.0 * margin_pt;
    let lines_per_page = (usable_height_pt / LINE_HEIGHT_PT) as usize;

    let mut doc = PdfDocument::new(title);
    let mut pages: Vec<PdfPage> = Vec::new();

    for chunk in lines.chunks(lines_per_page.max(1)) {
        let mut ops: Vec<Op> = Vec::new();
        for (line_idx, line) in chunk.iter().enumerate() {
            if line.text.is_empty() {
                continue;
            }
            let y_pt = page_h_pt - margin_pt - (line_idx as f32 * LINE_HEIGHT_PT);
            let font = if line.bold {
                BuiltinFont::HelveticaBold
            } else {
                BuiltinFont::Helvetica
            };
            let size = if line.bold {
                HEADER_SIZE_PT
            } else {
                BODY_SIZE_PT
            };

            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Pt(margin_pt),
                    y: Pt(y_pt),
                },
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(size),
                font,
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(line.text.clone())],
                font,
            });
            ops.push(Op::EndTextSection);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    debug!(pages = doc.pages.len(), "report paginated");

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    doc.save(&PdfSaveOptions::default(), &mut warnings)
}

/// Word-wrap one recovered text into lines of at most `max_width` chars.
/// Embedded newlines are respected; overlong words are broken hard.
fn wrap(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut out = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word;
            while word.len() > max_width {
                if !line.is_empty() {
                    out.push(std::mem::take(&mut line));
                }
                let (head, tail) = word.split_at(max_width);
                out.push(head.to_string());
                word = tail;
            }
            if line.is_empty() {
                line.push_str(word);
            } else if line.len() + 1 + word.len() <= max_width {
                line.push(' ');
                line.push_str(word);
            } else {
                out.push(std::mem::take(&mut line));
                line.push_str(word);
            }
        }
        out.push(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use caviard_core::types::DocumentRegion;

    fn entry(page: u32, text: &str) -> RecoveredText {
        RecoveredText {
            page,
            region: DocumentRegion::new(20.0, 20.0, 60.0, 60.0),
            text: text.to_string(),
        }
    }

    fn summary(recovered: u32) -> RestoreReport {
        RestoreReport {
            pages_processed: 3,
            escrows_recovered: recovered,
            escrows_failed: 0,
            failures: Vec::new(),
        }
    }

    #[test]
    fn renders_loadable_pdf() {
        let writer = RecoveryReportWriter::new();
        let bytes = writer
            .render(
                &[entry(1, "first secret"), entry(2, "second secret")],
                &summary(2),
            )
            .unwrap();

        let doc = lopdf::Document::load_mem(&bytes).expect("report must be a valid PDF");
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn empty_scan_still_produces_a_report() {
        let writer = RecoveryReportWriter::new();
        let bytes = writer.render(&[], &summary(0)).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).expect("report must be a valid PDF");
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn long_reports_paginate() {
        let writer = RecoveryReportWriter::new();
        let entries: Vec<RecoveredText> =
            (1..=80).map(|i| entry(i, "short recovered line")).collect();
        let bytes = writer.render(&entries, &summary(80)).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).expect("report must be a valid PDF");
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn wrap_respects_width_and_breaks_long_words() {
        let lines = wrap("alpha beta gamma delta", 11);
        assert!(lines.iter().all(|l| l.len() <= 11));

        let broken = wrap("abcdefghijklmnop", 5);
        assert_eq!(broken[0], "abcde");
        assert!(broken.iter().all(|l| l.len() <= 5));
    }
}
