//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/finsight/) and project (finsight.toml) level
//! configuration. Credentials are never serialized and are redacted in debug
//! output; validation fails fast with remediation guidance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{generation, ocr as ocr_constants, timeouts};
use crate::types::{AnalysisKind, FinsightError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// OCR collaborator settings
    pub ocr: OcrConfig,

    /// Language-model collaborator settings
    pub llm: LlmConfig,

    /// Report export settings
    pub export: ExportConfig,
}

impl Config {
    /// Validate configuration values and required fields.
    ///
    /// Returns `FinsightError::Config` with remediation guidance on failure.
    /// Credential presence is checked lazily by the clients so demo mode
    /// works without any secrets; value ranges are checked here.
    pub fn validate(&self) -> Result<()> {
        for (kind, temperature) in &self.llm.temperature_overrides {
            if !(0.0..=2.0).contains(temperature) {
                return Err(FinsightError::Config(format!(
                    "Temperature override for '{}' must be between 0.0 and 2.0, got {}",
                    kind, temperature
                )));
            }
        }

        for (kind, timeout) in &self.llm.timeout_overrides {
            if *timeout == 0 {
                return Err(FinsightError::Config(format!(
                    "Timeout override for '{}' must be greater than 0 seconds",
                    kind
                )));
            }
        }

        if self.ocr.poll_interval_ms == 0 {
            return Err(FinsightError::Config(
                "ocr.poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.ocr.poll_timeout_secs == 0 {
            return Err(FinsightError::Config(
                "ocr.poll_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(FinsightError::Config(
                "llm.max_tokens must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Check the fields the live pipeline needs, with remediation text.
    ///
    /// Called by commands that will actually contact the backends (demo mode
    /// skips the OCR half).
    pub fn require_llm(&self) -> Result<()> {
        if self.llm.endpoint.trim().is_empty() {
            return Err(FinsightError::Config(
                "Missing model endpoint. Set llm.endpoint in finsight.toml or \
                 FINSIGHT_LLM_ENDPOINT / AZURE_OPENAI_ENDPOINT."
                    .to_string(),
            ));
        }
        if self.llm.api_key.as_deref().unwrap_or("").trim().is_empty() {
            return Err(FinsightError::Config(
                "Missing model API key. Set FINSIGHT_LLM_API_KEY or AZURE_OPENAI_API_KEY."
                    .to_string(),
            ));
        }
        if self.llm.deployment.trim().is_empty() {
            return Err(FinsightError::Config(
                "Missing deployment/model identifier. Set llm.deployment or \
                 AZURE_OPENAI_DEPLOYMENT."
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Check the fields the OCR collaborator needs, with remediation text
    pub fn require_ocr(&self) -> Result<()> {
        if self.ocr.endpoint.trim().is_empty() {
            return Err(FinsightError::Config(
                "Missing OCR endpoint. Set ocr.endpoint in finsight.toml or \
                 FINSIGHT_OCR_ENDPOINT / AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT."
                    .to_string(),
            ));
        }
        if self.ocr.api_key.as_deref().unwrap_or("").trim().is_empty() {
            return Err(FinsightError::Config(
                "Missing OCR API key. Set FINSIGHT_OCR_API_KEY or \
                 AZURE_DOCUMENT_INTELLIGENCE_KEY."
                    .to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// OCR Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Service endpoint URL
    pub endpoint: String,

    /// API key; never serialized to output
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Service API version query parameter
    pub api_version: String,

    /// Analysis model identifier (layout-free text reading)
    pub model: String,

    /// Delay between result polls (milliseconds)
    pub poll_interval_ms: u64,

    /// Total polling budget (seconds)
    pub poll_timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            api_version: "2023-07-31".to_string(),
            model: "prebuilt-read".to_string(),
            poll_interval_ms: ocr_constants::POLL_INTERVAL_MS,
            poll_timeout_secs: ocr_constants::POLL_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_version", &self.api_version)
            .field("model", &self.model)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend endpoint URL
    pub endpoint: String,

    /// API key; never serialized to output
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Deployment/model identifier
    pub deployment: String,

    /// Backend API version query parameter
    pub api_version: String,

    /// Completion token cap per call
    pub max_tokens: u32,

    /// Per-kind temperature overrides, keyed by kind slug
    pub temperature_overrides: BTreeMap<String, f32>,

    /// Per-kind timeout overrides in seconds, keyed by kind slug
    pub timeout_overrides: BTreeMap<String, u64>,

    /// Price profile name; defaults to the deployment name
    pub price_profile: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            deployment: String::new(),
            api_version: "2024-02-01".to_string(),
            max_tokens: generation::MAX_TOKENS,
            temperature_overrides: BTreeMap::new(),
            timeout_overrides: BTreeMap::new(),
            price_profile: None,
        }
    }
}

impl LlmConfig {
    /// Temperature override for a kind, if configured
    pub fn temperature_for(&self, kind: AnalysisKind) -> Option<f32> {
        self.temperature_overrides.get(kind.slug()).copied()
    }

    /// Timeout override for a kind in seconds, if configured
    pub fn timeout_for(&self, kind: AnalysisKind) -> Option<u64> {
        self.timeout_overrides.get(kind.slug()).copied()
    }

    /// Name used for price table lookup
    pub fn profile_name(&self) -> &str {
        self.price_profile.as_deref().unwrap_or(&self.deployment)
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("max_tokens", &self.max_tokens)
            .field("temperature_overrides", &self.temperature_overrides)
            .field("timeout_overrides", &self.timeout_overrides)
            .field("price_profile", &self.price_profile)
            .finish()
    }
}

// =============================================================================
// Export Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory for exported reports
    pub output_dir: String,

    /// Title placed at the top of assembled reports
    pub report_title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: ".".to_string(),
            report_title: crate::constants::report::DEFAULT_TITLE.to_string(),
        }
    }
}

/// Default timeout in seconds for a kind when no override is configured
pub fn default_timeout_secs(kind: AnalysisKind) -> u64 {
    match kind {
        AnalysisKind::Summary => timeouts::SUMMARY_SECS,
        AnalysisKind::KpiTable => timeouts::KPI_SECS,
        AnalysisKind::Thematic => timeouts::THEMATIC_SECS,
        AnalysisKind::CustomReport => timeouts::DEFAULT_SECS,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_temperature_override_range() {
        let mut config = Config::default();
        config
            .llm
            .temperature_overrides
            .insert("summary".to_string(), 3.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.llm.timeout_overrides.insert("kpis".to_string(), 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_require_llm_remediation() {
        let config = Config::default();
        let err = config.require_llm().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("endpoint"));
        // Names the variable, never a value
        assert!(message.contains("AZURE_OPENAI_ENDPOINT"));
    }

    #[test]
    fn test_require_llm_passes_when_set() {
        let mut config = Config::default();
        config.llm.endpoint = "https://example.openai.azure.com".to_string();
        config.llm.api_key = Some("k".to_string());
        config.llm.deployment = "gpt-4o-mini".to_string();
        assert!(config.require_llm().is_ok());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let mut config = Config::default();
        config.llm.api_key = Some("super-secret-value".to_string());
        config.ocr.api_key = Some("other-secret".to_string());

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-value"));
        assert!(!rendered.contains("other-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_serialize_skips_keys() {
        let mut config = Config::default();
        config.llm.api_key = Some("super-secret-value".to_string());

        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("super-secret-value"));
    }

    #[test]
    fn test_kind_overrides() {
        let mut config = LlmConfig::default();
        config
            .temperature_overrides
            .insert("kpis".to_string(), 0.0);
        config.timeout_overrides.insert("summary".to_string(), 300);

        assert_eq!(config.temperature_for(AnalysisKind::KpiTable), Some(0.0));
        assert_eq!(config.temperature_for(AnalysisKind::Summary), None);
        assert_eq!(config.timeout_for(AnalysisKind::Summary), Some(300));
    }

    #[test]
    fn test_default_timeouts_per_kind() {
        assert_eq!(
            default_timeout_secs(AnalysisKind::KpiTable),
            timeouts::KPI_SECS
        );
        assert_eq!(
            default_timeout_secs(AnalysisKind::Summary),
            timeouts::SUMMARY_SECS
        );
    }
}
