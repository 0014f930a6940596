//! Per-Kind Generation Policy
//!
//! Fixed temperature/timeout/token parameters per analysis kind, with
//! configuration overrides. Deterministic extraction kinds run cold;
//! narrative kinds get some room.

use std::time::Duration;

use crate::config::{LlmConfig, default_timeout_secs};
use crate::constants::generation;
use crate::types::AnalysisKind;

/// Resolved generation parameters for one request kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationPolicy {
    pub temperature: f32,
    pub timeout: Duration,
    pub max_tokens: u32,
}

impl GenerationPolicy {
    /// Resolve the policy for a kind: built-in defaults overlaid with any
    /// configured per-kind overrides.
    pub fn resolve(kind: AnalysisKind, config: &LlmConfig) -> Self {
        let temperature = config.temperature_for(kind).unwrap_or(match kind {
            AnalysisKind::KpiTable => generation::EXTRACTIVE_TEMPERATURE,
            _ => generation::NARRATIVE_TEMPERATURE,
        });

        let timeout_secs = config
            .timeout_for(kind)
            .unwrap_or_else(|| default_timeout_secs(kind));

        Self {
            temperature,
            timeout: Duration::from_secs(timeout_secs),
            max_tokens: config.max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kpi_runs_cold() {
        let config = LlmConfig::default();
        let kpi = GenerationPolicy::resolve(AnalysisKind::KpiTable, &config);
        let summary = GenerationPolicy::resolve(AnalysisKind::Summary, &config);
        assert!(kpi.temperature < summary.temperature);
    }

    #[test]
    fn test_overrides_win() {
        let mut config = LlmConfig::default();
        config
            .temperature_overrides
            .insert("summary".to_string(), 0.9);
        config.timeout_overrides.insert("summary".to_string(), 300);

        let policy = GenerationPolicy::resolve(AnalysisKind::Summary, &config);
        assert_eq!(policy.temperature, 0.9);
        assert_eq!(policy.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_default_timeouts_applied() {
        let config = LlmConfig::default();
        let policy = GenerationPolicy::resolve(AnalysisKind::KpiTable, &config);
        assert_eq!(
            policy.timeout,
            Duration::from_secs(crate::constants::timeouts::KPI_SECS)
        );
    }
}
