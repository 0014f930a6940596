//! Model Pricing and Cost Estimation
//!
//! Price profiles per model family plus token/cost estimation.
//!
//! Token counts here are a deterministic character/word blend calibrated per
//! profile - an approximation for budgeting, NOT the backend's exact
//! tokenization. Exact dollar costs are only computed from usage the backend
//! actually reported.

use tracing::debug;

use crate::types::TokenUsage;

// =============================================================================
// Model Profiles
// =============================================================================

/// Static pricing row for one model family
#[derive(Debug, Clone, PartialEq)]
pub struct ModelProfile {
    /// Profile name matched (by prefix) against the deployment identifier
    pub name: &'static str,
    /// Average characters per token for this family (estimation calibration)
    pub chars_per_token: f64,
    /// Dollars per 1K input tokens
    pub input_per_1k: f64,
    /// Dollars per 1K output tokens
    pub output_per_1k: f64,
}

/// Built-in price table with a conservative fallback for unknown models
#[derive(Debug, Clone)]
pub struct PriceTable {
    profiles: Vec<ModelProfile>,
    fallback: ModelProfile,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PriceTable {
    pub fn builtin() -> Self {
        Self {
            profiles: vec![
                ModelProfile {
                    name: "gpt-4o-mini",
                    chars_per_token: 4.0,
                    input_per_1k: 0.000_15,
                    output_per_1k: 0.000_6,
                },
                ModelProfile {
                    name: "gpt-4o",
                    chars_per_token: 4.0,
                    input_per_1k: 0.002_5,
                    output_per_1k: 0.01,
                },
                ModelProfile {
                    name: "gpt-4-turbo",
                    chars_per_token: 4.0,
                    input_per_1k: 0.01,
                    output_per_1k: 0.03,
                },
                ModelProfile {
                    name: "gpt-35-turbo",
                    chars_per_token: 4.0,
                    input_per_1k: 0.000_5,
                    output_per_1k: 0.001_5,
                },
            ],
            // Unknown models are priced at the most expensive built-in rate
            // so estimates err on the high side
            fallback: ModelProfile {
                name: "default",
                chars_per_token: 4.0,
                input_per_1k: 0.01,
                output_per_1k: 0.03,
            },
        }
    }

    /// Look up a profile by deployment/model name.
    ///
    /// Deployment names commonly embed the model family (`gpt-4o-mini-prod`),
    /// so matching is by longest profile-name prefix. Unknown names fall back
    /// to the conservative default instead of failing.
    pub fn lookup(&self, name: &str) -> &ModelProfile {
        let lowered = name.to_ascii_lowercase();
        self.profiles
            .iter()
            .filter(|p| lowered.starts_with(p.name))
            .max_by_key(|p| p.name.len())
            .unwrap_or_else(|| {
                debug!("No price profile for '{}', using conservative default", name);
                &self.fallback
            })
    }
}

// =============================================================================
// Cost Estimator
// =============================================================================

/// Pre-call token/cost estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    pub tokens: u32,
    pub cost_usd: f64,
}

/// Token and dollar estimation against a price table
#[derive(Debug, Clone, Default)]
pub struct CostEstimator {
    table: PriceTable,
}

impl CostEstimator {
    pub fn new(table: PriceTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PriceTable {
        &self.table
    }

    /// Estimate input tokens and cost for sending `text` to `profile`.
    ///
    /// The count is the mean of a character-based estimate
    /// (chars / chars_per_token) and a word-based estimate (words / 0.75),
    /// rounded up. This is an approximation calibrated against typical
    /// business prose, not any vendor's tokenizer.
    pub fn estimate(&self, text: &str, profile: &ModelProfile) -> CostEstimate {
        let chars = text.chars().count() as f64;
        let words = text.split_whitespace().count() as f64;

        let char_based = chars / profile.chars_per_token;
        let word_based = words / 0.75;
        let tokens = ((char_based + word_based) / 2.0).ceil().max(0.0) as u32;

        CostEstimate {
            tokens,
            cost_usd: tokens as f64 / 1000.0 * profile.input_per_1k,
        }
    }

    /// Exact dollar cost of a completed call from backend-reported usage
    pub fn cost_of_usage(&self, usage: &TokenUsage, profile: &ModelProfile) -> f64 {
        usage.prompt_tokens as f64 / 1000.0 * profile.input_per_1k
            + usage.completion_tokens as f64 / 1000.0 * profile.output_per_1k
    }

    /// Session total: the exact sum of each recorded result's individually
    /// computed cost, never a re-derived estimate
    pub fn cumulative(&self, state: &crate::pipeline::PipelineState) -> f64 {
        state.cumulative_cost()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_prefix() {
        let table = PriceTable::builtin();
        assert_eq!(table.lookup("gpt-4o-mini").name, "gpt-4o-mini");
        // Deployment name with suffix still matches
        assert_eq!(table.lookup("gpt-4o-mini-prod-eu").name, "gpt-4o-mini");
        // Longest prefix wins: gpt-4o-mini, not gpt-4o
        assert_eq!(table.lookup("GPT-4O-MINI").name, "gpt-4o-mini");
        assert_eq!(table.lookup("gpt-4o-2024").name, "gpt-4o");
    }

    #[test]
    fn test_lookup_unknown_falls_back() {
        let table = PriceTable::builtin();
        let profile = table.lookup("my-custom-deployment");
        assert_eq!(profile.name, "default");
        // Conservative: priced at the top built-in rate
        assert!(profile.output_per_1k >= 0.03);
    }

    #[test]
    fn test_estimate_deterministic_and_monotonic() {
        let estimator = CostEstimator::default();
        let profile = estimator.table().lookup("gpt-4o-mini").clone();

        let short = estimator.estimate("Revenue grew.", &profile);
        let long = estimator.estimate(
            "Revenue grew substantially across all reported segments this year.",
            &profile,
        );

        assert_eq!(short, estimator.estimate("Revenue grew.", &profile));
        assert!(long.tokens > short.tokens);
        assert!(long.cost_usd > short.cost_usd);
    }

    #[test]
    fn test_estimate_empty_text() {
        let estimator = CostEstimator::default();
        let profile = estimator.table().lookup("gpt-4o").clone();
        let estimate = estimator.estimate("", &profile);
        assert_eq!(estimate.tokens, 0);
        assert_eq!(estimate.cost_usd, 0.0);
    }

    #[test]
    fn test_cost_of_usage_exact() {
        let estimator = CostEstimator::default();
        let profile = ModelProfile {
            name: "test",
            chars_per_token: 4.0,
            input_per_1k: 0.01,
            output_per_1k: 0.03,
        };

        let a = estimator.cost_of_usage(&TokenUsage::new(100, 50), &profile);
        let b = estimator.cost_of_usage(&TokenUsage::new(200, 75), &profile);

        assert!((a - (0.1 * 0.01 + 0.05 * 0.03)).abs() < 1e-12);
        assert!((b - (0.2 * 0.01 + 0.075 * 0.03)).abs() < 1e-12);
    }

    #[test]
    fn test_cumulative_sums_recorded_costs() {
        use crate::pipeline::PipelineState;
        use crate::types::{AnalysisKind, AnalysisResult, Fingerprint, Parameters};

        let estimator = CostEstimator::default();
        let profile = ModelProfile {
            name: "test",
            chars_per_token: 4.0,
            input_per_1k: 0.01,
            output_per_1k: 0.03,
        };

        let state = PipelineState::new();
        for (i, usage) in [TokenUsage::new(100, 50), TokenUsage::new(200, 75)]
            .into_iter()
            .enumerate()
        {
            let cost_usd = estimator.cost_of_usage(&usage, &profile);
            state.insert(
                Fingerprint::compute(AnalysisKind::Summary, &Parameters::new(), &i.to_string()),
                AnalysisResult {
                    kind: AnalysisKind::Summary,
                    content: "content".to_string(),
                    usage,
                    cost_usd,
                    model: "test".to_string(),
                    elapsed_ms: 1,
                },
            );
        }

        let expected = estimator.cost_of_usage(&TokenUsage::new(100, 50), &profile)
            + estimator.cost_of_usage(&TokenUsage::new(200, 75), &profile);
        assert!((estimator.cumulative(&state) - expected).abs() < 1e-12);
    }
}
