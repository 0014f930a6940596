//! DOCX Rendering
//!
//! Renders the report tree as a Word document via docx-rs, entirely
//! in-memory. Headings become sized bold runs, tables become real Word
//! tables, so section order and table structure survive the format.

use std::io::Cursor;

use docx_rs::{
    Docx, Paragraph, Run, Table as DocxTable, TableCell, TableRow,
};

use super::{Block, ReportDocument, export_error};
use crate::types::Result;

/// Run sizes in half-points
const TITLE_SIZE: usize = 48;
const HEADING_SIZE: usize = 32;
const SUBHEADING_SIZE: usize = 26;

pub fn render(document: &ReportDocument) -> Result<Vec<u8>> {
    let mut docx = Docx::new();

    docx = docx.add_paragraph(
        Paragraph::new().add_run(Run::new().add_text(document.title.as_str()).size(TITLE_SIZE).bold()),
    );
    docx = docx.add_paragraph(Paragraph::new().add_run(
        Run::new().add_text(format!(
            "Generated: {}",
            document.generated_at.format("%B %d, %Y")
        )),
    ));

    for block in &document.blocks {
        docx = match block {
            Block::Heading { level, text } => {
                let size = if *level <= 2 {
                    HEADING_SIZE
                } else {
                    SUBHEADING_SIZE
                };
                docx.add_paragraph(
                    Paragraph::new().add_run(Run::new().add_text(text.as_str()).size(size).bold()),
                )
            }
            Block::Paragraph(text) => {
                docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(text.as_str())))
            }
            Block::Table { headers, rows } => docx.add_table(build_table(headers, rows)),
        };
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| export_error("DOCX packing failed", e))?;

    Ok(buffer.into_inner())
}

fn build_table(headers: &[String], rows: &[Vec<String>]) -> DocxTable {
    let mut table_rows = Vec::with_capacity(rows.len() + 1);

    table_rows.push(TableRow::new(
        headers.iter().map(|h| cell(h, true)).collect(),
    ));
    for row in rows {
        table_rows.push(TableRow::new(row.iter().map(|c| cell(c, false)).collect()));
    }

    DocxTable::new(table_rows)
}

fn cell(text: &str, bold: bool) -> TableCell {
    let mut run = Run::new().add_text(text);
    if bold {
        run = run.bold();
    }
    TableCell::new().add_paragraph(Paragraph::new().add_run(run))
}
