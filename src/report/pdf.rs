//! PDF Rendering
//!
//! Renders the report tree to PDF bytes via printpdf's builtin Helvetica
//! fonts - no external font files. Layout is a simple cursor: wrapped text
//! lines top to bottom, new pages as the cursor runs out, tables as aligned
//! monospaced-style rows under a bold header line.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use super::{Block, ReportDocument, export_error};
use crate::types::Result;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;

const TITLE_PT: f32 = 20.0;
const HEADING_PT: f32 = 14.0;
const BODY_PT: f32 = 10.0;

/// Approximate characters that fit one body line inside the margins
const WRAP_COLS: usize = 95;

pub fn render(document: &ReportDocument) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        document.title.clone(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| export_error("PDF font setup failed", e))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| export_error("PDF font setup failed", e))?;

    let mut writer = PageWriter {
        doc: &doc,
        layer: doc.get_page(page).get_layer(layer),
        cursor_mm: PAGE_HEIGHT_MM - MARGIN_MM,
    };

    writer.line(&document.title, TITLE_PT, &bold);
    writer.line(
        &format!("Generated: {}", document.generated_at.format("%B %d, %Y")),
        BODY_PT,
        &regular,
    );
    writer.gap(4.0);

    for block in &document.blocks {
        match block {
            Block::Heading { level, text } => {
                writer.gap(3.0);
                let size = if *level <= 2 { HEADING_PT } else { BODY_PT + 2.0 };
                writer.line(text, size, &bold);
                writer.gap(1.0);
            }
            Block::Paragraph(text) => {
                for wrapped in wrap(text, WRAP_COLS) {
                    writer.line(&wrapped, BODY_PT, &regular);
                }
                writer.gap(2.0);
            }
            Block::Table { headers, rows } => {
                let widths = column_widths(headers, rows);
                writer.line(&format_row(headers, &widths), BODY_PT, &bold);
                for row in rows {
                    for wrapped in wrap(&format_row(row, &widths), WRAP_COLS + 20) {
                        writer.line(&wrapped, BODY_PT, &regular);
                    }
                }
                writer.gap(2.0);
            }
        }
    }

    drop(writer);
    doc.save_to_bytes()
        .map_err(|e| export_error("PDF serialization failed", e))
}

/// Cursor-based page writer with automatic page breaks
struct PageWriter<'a> {
    doc: &'a printpdf::PdfDocumentReference,
    layer: PdfLayerReference,
    cursor_mm: f32,
}

impl PageWriter<'_> {
    fn line(&mut self, text: &str, size_pt: f32, font: &IndirectFontRef) {
        let line_height_mm = size_pt * 0.45;
        if self.cursor_mm - line_height_mm < MARGIN_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.cursor_mm = PAGE_HEIGHT_MM - MARGIN_MM;
        }

        self.cursor_mm -= line_height_mm;
        self.layer
            .use_text(text, size_pt, Mm(MARGIN_MM), Mm(self.cursor_mm), font);
    }

    fn gap(&mut self, mm: f32) {
        self.cursor_mm -= mm;
    }
}

/// Greedy word wrap at a character budget
fn wrap(text: &str, cols: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > cols {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }
    widths
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let width = widths.get(i).copied().unwrap_or(cell.chars().count());
            format!("{:<width$}", cell, width = width)
        })
        .collect::<Vec<_>>()
        .join("   ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn document() -> ReportDocument {
        ReportDocument {
            title: "Financial Report Analysis".to_string(),
            generated_at: Utc::now(),
            blocks: vec![
                Block::Heading {
                    level: 2,
                    text: "Executive Summary".to_string(),
                },
                Block::Paragraph(
                    "Revenue grew strongly across all segments with margins expanding \
                     and free cash flow reaching record levels for the fiscal year."
                        .to_string(),
                ),
                Block::Table {
                    headers: vec!["Metric".to_string(), "Value".to_string()],
                    rows: vec![
                        vec!["Revenue".to_string(), "$45.2M".to_string()],
                        vec!["Margin".to_string(), "21%".to_string()],
                    ],
                },
            ],
        }
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render(&document()).unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
        assert!(bytes.len() > 500);
    }

    #[test]
    fn test_long_document_paginates() {
        let mut doc = document();
        for i in 0..200 {
            doc.blocks.push(Block::Paragraph(format!(
                "Filler paragraph {} keeping the cursor moving down the page.",
                i
            )));
        }
        // Overflowing content must not panic; it rolls onto new pages
        assert!(render(&doc).is_ok());
    }

    #[test]
    fn test_wrap_budget() {
        let text = "one two three four five six seven eight nine ten";
        let lines = wrap(text, 15);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 15));
    }

    #[test]
    fn test_format_row_alignment() {
        let widths = column_widths(
            &["Metric".to_string(), "Value".to_string()],
            &[vec!["Revenue".to_string(), "$45.2M".to_string()]],
        );
        assert_eq!(widths, vec![7, 6]);
        let row = format_row(
            &["Margin".to_string(), "21%".to_string()],
            &widths,
        );
        assert_eq!(row, "Margin    21%   ");
    }
}
