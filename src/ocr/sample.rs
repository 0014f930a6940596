//! Demo-Mode Sample Engine
//!
//! Substitutes a fixed sample financial report for the OCR collaborator so
//! the full pipeline can be exercised without credentials or a document.
//! The sample deliberately carries typical OCR artifacts (page-number
//! lines, repeated headers, broken words, fused currency tokens) to give
//! the normalizer real work.

use async_trait::async_trait;

use super::OcrEngine;
use crate::types::{ExtractedText, RawDocument, Result};

#[derive(Debug, Default, Clone)]
pub struct SampleOcr;

impl SampleOcr {
    pub fn new() -> Self {
        Self
    }

    /// The fixed sample as the pipeline would receive it from OCR
    pub fn sample_text() -> ExtractedText {
        ExtractedText::from_pages(vec![
            vec![
                "Annual Financial Review".to_string(),
                "Financial Performance Overview".to_string(),
                "Total revenue for fiscal year 2024 reached $45.2million, representing a".to_string(),
                "23 percent increase compared to the previous year. This growth was".to_string(),
                "primarily driven by digital trans-".to_string(),
                "formation initiatives which accounted for 67 percent of new revenue".to_string(),
                "streams.".to_string(),
                "".to_string(),
                "Expense Management".to_string(),
                "Operating expenses increased by 15 percent to $32.1million,".to_string(),
                "demonstrating improved operational efficiency as revenue grew faster".to_string(),
                "than costs. The company maintained a 71 percent gross margin.".to_string(),
                "Page 1".to_string(),
            ],
            vec![
                "Annual Financial Review".to_string(),
                "Profitability Analysis".to_string(),
                "Net profit margin improved from 18 percent to 21 percent, with EBITDA".to_string(),
                "reaching $12.4million. Return on equity increased to 24 percent,".to_string(),
                "exceeding industry benchmarks of 18 to 20 percent.".to_string(),
                "".to_string(),
                "Cash Flow Performance".to_string(),
                "Operating cash flow was $13.2million, a 28 percent increase year over".to_string(),
                "year. Free cash flow reached $9.8million after capital expenditures".to_string(),
                "of $3.4million.".to_string(),
                "Page 2".to_string(),
            ],
            vec![
                "Annual Financial Review".to_string(),
                "Market Position and Trends".to_string(),
                "Market share in core segments grew from 12 percent to 15 percent.".to_string(),
                "Customer acquisition costs decreased by 18 percent while customer".to_string(),
                "lifetime value increased by 32 percent. Digital channels now".to_string(),
                "represent 67 percent of total revenue.".to_string(),
                "".to_string(),
                "Sustainability and ESG Initiatives".to_string(),
                "Sustainability investments totaled $3.2million, with measurable carbon".to_string(),
                "reduction of 22 percent. Green revenue reached $8.4million, or 19".to_string(),
                "percent of total revenue.".to_string(),
                "Page 3".to_string(),
            ],
            vec![
                "Annual Financial Review".to_string(),
                "Risk Factors and Challenges".to_string(),
                "Supply chain disruptions affected 12 percent of operations, resulting".to_string(),
                "in $2.1million of additional costs. Currency fluctuations impacted".to_string(),
                "margins by 2.3 percent. Regulatory compliance costs increased by".to_string(),
                "$1.2million year over year.".to_string(),
                "".to_string(),
                "Strategic Outlook".to_string(),
                "Management projects 18 to 22 percent revenue growth for 2025, driven".to_string(),
                "by product expansion and market penetration. Capital expenditure".to_string(),
                "plans include $5.5million for technology infrastructure and".to_string(),
                "$2.8million for sustainability initiatives.".to_string(),
                "Page 4".to_string(),
            ],
        ])
    }
}

#[async_trait]
impl OcrEngine for SampleOcr {
    async fn extract(&self, _document: &RawDocument) -> Result<ExtractedText> {
        Ok(Self::sample_text())
    }

    fn name(&self) -> &str {
        "sample"
    }
}
