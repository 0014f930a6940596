//! Response Shape Validation
//!
//! Strict per-kind output contracts. The model's text is checked against the
//! shape its prompt demanded before anything downstream sees it; mismatches
//! become `InvalidResponse` and are never cached.

use crate::report::markdown;
use crate::types::{AnalysisKind, GatewayError, GatewayErrorKind};

/// Minimum characters for a narrative response to count as substance
const MIN_NARRATIVE_CHARS: usize = 40;

/// Validate model output against the contract of its request kind
pub fn validate_content(kind: AnalysisKind, content: &str) -> Result<(), GatewayError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::new(
            GatewayErrorKind::InvalidResponse,
            format!("{} response was empty", kind),
        ));
    }

    match kind {
        AnalysisKind::KpiTable => validate_kpi_table(trimmed),
        AnalysisKind::Summary | AnalysisKind::Thematic | AnalysisKind::CustomReport => {
            validate_narrative(kind, trimmed)
        }
    }
}

/// KPI responses must parse as a Markdown table with a header and data rows
fn validate_kpi_table(content: &str) -> Result<(), GatewayError> {
    match markdown::parse_table(content) {
        Some(table) if !table.rows.is_empty() => {
            if table.headers.len() < 2 {
                return Err(GatewayError::new(
                    GatewayErrorKind::InvalidResponse,
                    format!(
                        "KPI table has {} column(s), expected at least Metric and Value",
                        table.headers.len()
                    ),
                ));
            }
            Ok(())
        }
        Some(_) => Err(GatewayError::new(
            GatewayErrorKind::InvalidResponse,
            "KPI table contained a header but no data rows",
        )),
        None => Err(GatewayError::new(
            GatewayErrorKind::InvalidResponse,
            "KPI response did not contain a parseable Markdown table",
        )),
    }
}

fn validate_narrative(kind: AnalysisKind, content: &str) -> Result<(), GatewayError> {
    if content.chars().count() < MIN_NARRATIVE_CHARS {
        return Err(GatewayError::new(
            GatewayErrorKind::InvalidResponse,
            format!(
                "{} response too short to be a usable analysis ({} chars)",
                kind,
                content.chars().count()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "| Metric | Value | Period |\n\
                         |--------|-------|--------|\n\
                         | Revenue | $45.2M | FY2024 |\n\
                         | Net margin | 21% | FY2024 |";

    #[test]
    fn test_kpi_table_accepted() {
        assert!(validate_content(AnalysisKind::KpiTable, TABLE).is_ok());
    }

    #[test]
    fn test_kpi_table_with_preamble_accepted() {
        let content = format!("Here are the KPIs:\n\n{}", TABLE);
        assert!(validate_content(AnalysisKind::KpiTable, &content).is_ok());
    }

    #[test]
    fn test_kpi_prose_rejected() {
        let err =
            validate_content(AnalysisKind::KpiTable, "Revenue was strong this year.").unwrap_err();
        assert_eq!(err.kind, GatewayErrorKind::InvalidResponse);
    }

    #[test]
    fn test_kpi_header_only_rejected() {
        let header_only = "| Metric | Value |\n|--------|-------|";
        let err = validate_content(AnalysisKind::KpiTable, header_only).unwrap_err();
        assert_eq!(err.kind, GatewayErrorKind::InvalidResponse);
    }

    #[test]
    fn test_single_column_table_rejected() {
        let narrow = "| Metric |\n|--------|\n| Revenue |";
        let err = validate_content(AnalysisKind::KpiTable, narrow).unwrap_err();
        assert_eq!(err.kind, GatewayErrorKind::InvalidResponse);
    }

    #[test]
    fn test_narrative_accepted() {
        let summary = "Revenue grew 23 percent to $45.2 million, driven by digital \
                       initiatives, while margins expanded to 21 percent.";
        assert!(validate_content(AnalysisKind::Summary, summary).is_ok());
    }

    #[test]
    fn test_empty_rejected() {
        for kind in [AnalysisKind::Summary, AnalysisKind::KpiTable] {
            let err = validate_content(kind, "   \n ").unwrap_err();
            assert_eq!(err.kind, GatewayErrorKind::InvalidResponse);
        }
    }

    #[test]
    fn test_trivial_narrative_rejected() {
        let err = validate_content(AnalysisKind::Thematic, "OK.").unwrap_err();
        assert_eq!(err.kind, GatewayErrorKind::InvalidResponse);
    }
}
