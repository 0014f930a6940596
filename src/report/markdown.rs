//! Markdown Parsing and Rendering
//!
//! The bridge between model output (Markdown text) and the block tree:
//! parses headings, pipe tables, and paragraphs, and renders the tree back.
//! The table parser is also the shape check behind KPI response validation.

use super::{Block, ReportDocument};

// =============================================================================
// Table Parsing
// =============================================================================

/// A parsed pipe table
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Find and parse the first pipe table in `content`.
///
/// Accepts surrounding prose; requires a header row followed by a separator
/// row (`|---|---|`). Returns `None` when no such table exists.
pub fn parse_table(content: &str) -> Option<ParsedTable> {
    let lines: Vec<&str> = content.lines().collect();

    for (idx, window) in lines.windows(2).enumerate() {
        if is_table_row(window[0]) && is_separator_row(window[1]) {
            let headers = split_row(window[0]);
            let rows = lines[idx + 2..]
                .iter()
                .take_while(|line| is_table_row(line))
                .map(|line| split_row(line))
                .collect();
            return Some(ParsedTable { headers, rows });
        }
    }

    None
}

fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.len() > 1
}

fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    is_table_row(trimmed)
        && trimmed
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' '))
        && trimmed.contains('-')
}

fn split_row(line: &str) -> Vec<String> {
    line.trim()
        .trim_matches('|')
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

// =============================================================================
// Block Parsing
// =============================================================================

/// Parse Markdown text into report blocks.
///
/// Recognizes `#`-headings, pipe tables, and blank-line-delimited
/// paragraphs. Anything else is paragraph text; nothing is dropped.
pub fn parse_blocks(content: &str) -> Vec<Block> {
    let lines: Vec<&str> = content.lines().collect();
    let mut blocks = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();

        if line.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            i += 1;
            continue;
        }

        if let Some((level, text)) = parse_heading(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading { level, text });
            i += 1;
            continue;
        }

        if is_table_row(line) && i + 1 < lines.len() && is_separator_row(lines[i + 1]) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let headers = split_row(line);
            let mut rows = Vec::new();
            i += 2;
            while i < lines.len() && is_table_row(lines[i]) {
                rows.push(split_row(lines[i]));
                i += 1;
            }
            blocks.push(Block::Table { headers, rows });
            continue;
        }

        paragraph.push(line.to_string());
        i += 1;
    }

    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

fn parse_heading(line: &str) -> Option<(u8, String)> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = line[hashes..].trim();
    if rest.is_empty() {
        return None;
    }
    Some((hashes as u8, rest.to_string()))
}

fn flush_paragraph(paragraph: &mut Vec<String>, blocks: &mut Vec<Block>) {
    if !paragraph.is_empty() {
        blocks.push(Block::Paragraph(paragraph.join(" ")));
        paragraph.clear();
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Render a report document as Markdown
pub fn render(document: &ReportDocument) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", document.title));
    out.push_str(&format!(
        "_Generated: {}_\n\n",
        document.generated_at.format("%B %d, %Y")
    ));

    for block in &document.blocks {
        match block {
            Block::Heading { level, text } => {
                out.push_str(&format!("{} {}\n\n", "#".repeat(*level as usize), text));
            }
            Block::Paragraph(text) => {
                out.push_str(text);
                out.push_str("\n\n");
            }
            Block::Table { headers, rows } => {
                out.push_str(&render_row(headers));
                out.push_str(&format!(
                    "|{}\n",
                    headers.iter().map(|_| "---|").collect::<String>()
                ));
                for row in rows {
                    out.push_str(&render_row(row));
                }
                out.push('\n');
            }
        }
    }

    out
}

fn render_row(cells: &[String]) -> String {
    format!("| {} |\n", cells.join(" | "))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const TABLE: &str = "| Metric | Value | Period |\n\
                         |--------|-------|--------|\n\
                         | Revenue | $45.2M | FY2024 |\n\
                         | Margin | 21% | FY2024 |";

    #[test]
    fn test_parse_table() {
        let table = parse_table(TABLE).unwrap();
        assert_eq!(table.headers, vec!["Metric", "Value", "Period"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["Revenue", "$45.2M", "FY2024"]);
    }

    #[test]
    fn test_parse_table_with_surrounding_prose() {
        let content = format!("Here you go:\n\n{}\n\nThat is all.", TABLE);
        let table = parse_table(&content).unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_parse_table_alignment_separators() {
        let aligned = "| A | B |\n|:--|--:|\n| 1 | 2 |";
        let table = parse_table(aligned).unwrap();
        assert_eq!(table.rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn test_no_table_in_prose() {
        assert!(parse_table("Revenue was strong | as expected.").is_none());
        assert!(parse_table("").is_none());
    }

    #[test]
    fn test_parse_blocks_mixed() {
        let content = format!(
            "## Overview\n\nRevenue grew\nacross segments.\n\n{}\n\nClosing remarks.",
            TABLE
        );
        let blocks = parse_blocks(&content);

        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 2,
                text: "Overview".to_string()
            }
        );
        assert_eq!(
            blocks[1],
            Block::Paragraph("Revenue grew across segments.".to_string())
        );
        assert!(matches!(blocks[2], Block::Table { .. }));
        assert_eq!(blocks[3], Block::Paragraph("Closing remarks.".to_string()));
    }

    #[test]
    fn test_parse_blocks_plain_prose() {
        let blocks = parse_blocks("Just one paragraph of analysis.");
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_round_trip_preserves_table_structure() {
        let document = ReportDocument {
            title: "Report".to_string(),
            generated_at: Utc::now(),
            blocks: parse_blocks(TABLE),
        };

        let rendered = render(&document);
        let reparsed = parse_table(&rendered).unwrap();
        assert_eq!(reparsed.headers, vec!["Metric", "Value", "Period"]);
        assert_eq!(reparsed.rows.len(), 2);
    }

    #[test]
    fn test_render_heading_levels() {
        let document = ReportDocument {
            title: "T".to_string(),
            generated_at: Utc::now(),
            blocks: vec![Block::Heading {
                level: 3,
                text: "Deep".to_string(),
            }],
        };
        assert!(render(&document).contains("### Deep"));
    }
}
