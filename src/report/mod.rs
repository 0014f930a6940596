//! Report Assembly and Export
//!
//! Combines named analysis sections into a format-neutral document tree
//! (headings, paragraphs, tables) and renders it to Markdown, DOCX, or PDF
//! bytes. Assembly preserves caller order and renders a placeholder for
//! failed sections; no model calls happen here.

pub mod markdown;

mod docx;
mod pdf;

use chrono::{DateTime, Utc};

use crate::pipeline::SectionOutcome;
use crate::types::{FinsightError, Result};

// =============================================================================
// Document Tree
// =============================================================================

/// One block of a format-neutral report document
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// Format-neutral report: title + ordered blocks
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub blocks: Vec<Block>,
}

// =============================================================================
// Export Formats
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Docx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Markdown),
            "docx" | "word" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!(
                "Unknown export format: {}. Valid values: md, docx, pdf",
                other
            )),
        }
    }
}

// =============================================================================
// Assembly
// =============================================================================

/// Assemble section outcomes into a report document.
///
/// Sections keep their caller order. A failed section becomes a heading plus
/// a placeholder paragraph naming the condition, so succeeding siblings still
/// appear in the export.
pub fn assemble(title: &str, outcomes: &[SectionOutcome]) -> ReportDocument {
    let mut blocks = Vec::new();

    for outcome in outcomes {
        blocks.push(Block::Heading {
            level: 2,
            text: outcome.request.title(),
        });

        match &outcome.result {
            Ok(result) => blocks.extend(markdown::parse_blocks(&result.content)),
            Err(err) => blocks.push(Block::Paragraph(format!(
                "This section could not be generated ({}). {}",
                err,
                err.remediation()
            ))),
        }
    }

    ReportDocument {
        title: title.to_string(),
        generated_at: Utc::now(),
        blocks,
    }
}

/// Render a report document to bytes in the requested format
pub fn render(document: &ReportDocument, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Markdown => Ok(markdown::render(document).into_bytes()),
        ExportFormat::Docx => docx::render(document),
        ExportFormat::Pdf => pdf::render(document),
    }
}

/// Map renderer-internal failures onto the export error surface
pub(crate) fn export_error(context: &str, err: impl std::fmt::Display) -> FinsightError {
    FinsightError::Export(format!("{}: {}", context, err))
}

// =============================================================================
// Tests
// =============================================================================
