//! Prompt Templates
//!
//! Fixed instruction templates per analysis kind. Each kind pins the output
//! shape in its system message so responses can be validated mechanically;
//! the document text always travels as user content.

use crate::types::{AnalysisKind, Parameters};

/// Built-in thematic analysis catalog
pub const THEMES: &[&str] = &[
    "Revenue & Growth",
    "Expenses & Cost Structure",
    "Profitability & Margins",
    "Cash Flow & Liquidity",
    "Balance Sheet Health",
    "Market Trends & Risks",
    "Operational Efficiency",
    "ESG & Sustainability (Financial Impact)",
];

const SUMMARY_SYSTEM: &str = "You are a senior financial analyst. Create a concise, \
professional executive summary of the document. Focus on main themes, key findings, \
risks, and strategic insights. Avoid unnecessary detail. Write in clear business \
English for CFO-level readers.";

const KPI_SYSTEM: &str = "You are a financial data analyst. From the text below, \
extract the most important quantitative insights as KPIs. Focus on percentages, \
ranges, counts, and other numeric facts covering revenue, growth, costs, margins, \
cash flow, market position, and sustainability impacts. Return the result ONLY as a \
Markdown table with columns: Metric, Value, Period. Use a dash for an unknown \
period. Do not add any commentary before or after the table.";

const THEMATIC_SYSTEM: &str = "You are a senior financial analyst. Extract only the \
content related to the selected financial theme. Provide a precise 6-10 sentence \
summary focused on performance indicators, risks, opportunities, and strategic \
insights. Maintain a CFO-level analytical tone. Do NOT include unrelated topics.";

/// A rendered prompt pair
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Render the prompt for a leaf analysis kind.
///
/// Composite kinds have no template of their own; callers expand them into
/// leaf sections first.
pub fn build(kind: AnalysisKind, parameters: &Parameters, document: &str) -> Prompt {
    match kind {
        AnalysisKind::Summary | AnalysisKind::CustomReport => Prompt {
            system: SUMMARY_SYSTEM.to_string(),
            user: document.to_string(),
        },
        AnalysisKind::KpiTable => Prompt {
            system: KPI_SYSTEM.to_string(),
            user: document.to_string(),
        },
        AnalysisKind::Thematic => {
            let theme = parameters
                .get("theme")
                .map(String::as_str)
                .unwrap_or("General Financial Performance");
            Prompt {
                system: THEMATIC_SYSTEM.to_string(),
                user: format!("Theme: {}\n\nDocument:\n{}", theme, document),
            }
        }
    }
}

/// Check a theme name against the built-in catalog (case-insensitive)
pub fn is_known_theme(theme: &str) -> bool {
    THEMES.iter().any(|t| t.eq_ignore_ascii_case(theme))
}
