//! Analysis Data Model
//!
//! Request/result types for the model-driven half of the pipeline, plus the
//! fingerprint used for session-scoped caching.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::document::CleanedText;

// =============================================================================
// Analysis Kind
// =============================================================================

/// The analyses the pipeline can produce.
///
/// `Thematic` reads its theme from the `theme` parameter; `CustomReport` is a
/// composite over an ordered section list carried in the `sections` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisKind {
    /// Executive summary for CFO-level readers
    Summary,
    /// Quantitative KPI extraction as a Markdown table
    KpiTable,
    /// Single-theme analytical summary
    Thematic,
    /// Composite report over an ordered list of sections
    CustomReport,
}

impl AnalysisKind {
    /// Stable tag used in fingerprints and config override keys
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::KpiTable => "kpis",
            Self::Thematic => "thematic",
            Self::CustomReport => "report",
        }
    }

    /// Leaf kinds that map to a single model call
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Self::CustomReport)
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl std::str::FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "kpis" | "kpi" | "kpi-table" => Ok(Self::KpiTable),
            "thematic" | "theme" => Ok(Self::Thematic),
            "report" | "custom-report" => Ok(Self::CustomReport),
            _ => Err(format!(
                "Unknown analysis kind: {}. Valid values: summary, kpis, thematic, report",
                s
            )),
        }
    }
}

/// Parameter map for an analysis request.
///
/// BTreeMap keeps iteration order deterministic so equal parameter sets always
/// fingerprint identically.
pub type Parameters = BTreeMap<String, String>;

// =============================================================================
// Analysis Request
// =============================================================================

/// An issued analysis request. Immutable once built.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub kind: AnalysisKind,
    pub parameters: Parameters,
    pub source: CleanedText,
}

impl AnalysisRequest {
    pub fn new(kind: AnalysisKind, source: CleanedText, parameters: Parameters) -> Self {
        Self {
            kind,
            parameters,
            source,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(self.kind, &self.parameters, self.source.as_str())
    }
}

// =============================================================================
// Fingerprint
// =============================================================================

/// Deterministic identity of a (kind, parameters, source text) combination.
///
/// Hex SHA-256; equal inputs always produce equal fingerprints, which is the
/// basis of the session cache and the at-most-one-in-flight-call invariant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(kind: AnalysisKind, parameters: &Parameters, source: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(kind.slug().as_bytes());
        hasher.update([0u8]);
        for (key, value) in parameters {
            hasher.update(key.as_bytes());
            hasher.update([0u8]);
            hasher.update(value.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(source.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short prefix is enough for logs
        write!(f, "{}", &self.0[..12.min(self.0.len())])
    }
}

// =============================================================================
// Token Usage
// =============================================================================

/// Token usage reported by the model backend for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            prompt_tokens: self.prompt_tokens + other.prompt_tokens,
            completion_tokens: self.completion_tokens + other.completion_tokens,
        }
    }
}

// =============================================================================
// Analysis Result
// =============================================================================

/// Completed analysis with usage and cost accounting. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub kind: AnalysisKind,
    /// Generated content; Markdown for table-shaped kinds
    pub content: String,
    pub usage: TokenUsage,
    /// Dollar cost of this call under the active price profile
    pub cost_usd: f64,
    /// Model/deployment that produced the content
    pub model: String,
    /// Wall-clock duration of the producing call
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Parameters {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            AnalysisKind::Summary,
            AnalysisKind::KpiTable,
            AnalysisKind::Thematic,
            AnalysisKind::CustomReport,
        ] {
            assert_eq!(kind.slug().parse::<AnalysisKind>().unwrap(), kind);
        }
        assert!("nonsense".parse::<AnalysisKind>().is_err());
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let p = params(&[("theme", "Revenue & Growth")]);
        let a = Fingerprint::compute(AnalysisKind::Thematic, &p, "doc text");
        let b = Fingerprint::compute(AnalysisKind::Thematic, &p, "doc text");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_sensitive_to_inputs() {
        let p = params(&[("theme", "Revenue & Growth")]);
        let base = Fingerprint::compute(AnalysisKind::Thematic, &p, "doc text");

        let other_kind = Fingerprint::compute(AnalysisKind::Summary, &p, "doc text");
        assert_ne!(base, other_kind);

        let other_text = Fingerprint::compute(AnalysisKind::Thematic, &p, "different text");
        assert_ne!(base, other_text);

        let other_params = Fingerprint::compute(
            AnalysisKind::Thematic,
            &params(&[("theme", "Cash Flow & Liquidity")]),
            "doc text",
        );
        assert_ne!(base, other_params);
    }

    #[test]
    fn test_fingerprint_parameter_order_irrelevant() {
        // BTreeMap sorts keys, so insertion order cannot matter
        let mut first = Parameters::new();
        first.insert("a".to_string(), "1".to_string());
        first.insert("b".to_string(), "2".to_string());

        let mut second = Parameters::new();
        second.insert("b".to_string(), "2".to_string());
        second.insert("a".to_string(), "1".to_string());

        assert_eq!(
            Fingerprint::compute(AnalysisKind::Summary, &first, "t"),
            Fingerprint::compute(AnalysisKind::Summary, &second, "t")
        );
    }

    #[test]
    fn test_token_usage_arithmetic() {
        let a = TokenUsage::new(100, 50);
        let b = TokenUsage::new(200, 75);
        assert_eq!(a.total(), 150);
        let sum = a.add(&b);
        assert_eq!(sum.prompt_tokens, 300);
        assert_eq!(sum.completion_tokens, 125);
    }
}
