//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/finsight/config.toml)
//! 3. Project config (finsight.toml in the working directory)
//! 4. Environment variables (FINSIGHT_* prefix)
//! 5. Well-known Azure variable names from the original deployment surface
//!    (AZURE_OPENAI_*, AZURE_DOCUMENT_INTELLIGENCE_*)
//!
//! Loaded once at session start; missing or invalid values fail fast with
//! remediation guidance.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use tracing::debug;

use super::types::Config;
use crate::types::{FinsightError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with the full resolution chain:
    /// defaults → global → project → env vars → Azure fallbacks
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // FINSIGHT_LLM_ENDPOINT -> llm.endpoint, FINSIGHT_OCR_MODEL -> ocr.model
        figment = figment.merge(Env::prefixed("FINSIGHT_").split("_").lowercase(true));

        let mut config: Config = figment
            .extract()
            .map_err(|e| FinsightError::Config(format!("Configuration error: {}", e)))?;

        // Multi-word fields (api_key) cannot travel through the split
        // mapping; credentials and the original Azure variable names are
        // resolved explicitly
        Self::apply_env_fallbacks(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only (plus defaults)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| FinsightError::Config(format!("Configuration error: {}", e)))
    }

    /// Fill unset fields from explicit variable names: the documented
    /// FINSIGHT_* credentials first, then the Azure names the original
    /// deployment used, so existing .env files keep working.
    fn apply_env_fallbacks(config: &mut Config) {
        fn first_set(vars: &[&str]) -> Option<String> {
            vars.iter()
                .filter_map(|var| env::var(var).ok())
                .find(|value| !value.trim().is_empty())
        }

        fn fallback(target: &mut String, vars: &[&str]) {
            if target.trim().is_empty()
                && let Some(value) = first_set(vars)
            {
                *target = value;
            }
        }

        fn fallback_opt(target: &mut Option<String>, vars: &[&str]) {
            if target.as_deref().unwrap_or("").trim().is_empty()
                && let Some(value) = first_set(vars)
            {
                *target = Some(value);
            }
        }

        fallback(&mut config.llm.endpoint, &["AZURE_OPENAI_ENDPOINT"]);
        fallback_opt(
            &mut config.llm.api_key,
            &["FINSIGHT_LLM_API_KEY", "AZURE_OPENAI_API_KEY"],
        );
        fallback(&mut config.llm.deployment, &["AZURE_OPENAI_DEPLOYMENT"]);
        if let Some(version) = first_set(&["AZURE_OPENAI_API_VERSION"]) {
            config.llm.api_version = version;
        }

        fallback(
            &mut config.ocr.endpoint,
            &["AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT"],
        );
        fallback_opt(
            &mut config.ocr.api_key,
            &["FINSIGHT_OCR_API_KEY", "AZURE_DOCUMENT_INTELLIGENCE_KEY"],
        );
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to the global config directory (~/.config/finsight/)
    pub fn global_dir() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("finsight"))
    }

    /// Get path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to the project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("finsight.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Write a starter project config file
    pub fn init_project(force: bool) -> Result<PathBuf> {
        let path = Self::project_config_path();
        if path.exists() && !force {
            return Err(FinsightError::Config(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        fs::write(&path, Self::starter_config())?;
        Ok(path)
    }

    fn starter_config() -> &'static str {
        r#"# finsight configuration
# API keys are read from the environment, never from this file:
#   FINSIGHT_LLM_API_KEY  (or AZURE_OPENAI_API_KEY)
#   FINSIGHT_OCR_API_KEY  (or AZURE_DOCUMENT_INTELLIGENCE_KEY)

[llm]
endpoint = ""
deployment = ""
api_version = "2024-02-01"
max_tokens = 2048

# Per-kind tuning, keyed by kind slug (summary, kpis, thematic)
[llm.temperature_overrides]
# kpis = 0.0

[llm.timeout_overrides]
# summary = 180

[ocr]
endpoint = ""
api_version = "2023-07-31"
model = "prebuilt-read"

[export]
output_dir = "."
report_title = "Financial Report Analysis"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("finsight.toml");
        fs::write(
            &path,
            r#"
[llm]
deployment = "gpt-4o-mini"
max_tokens = 512

[llm.temperature_overrides]
kpis = 0.0
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.llm.deployment, "gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 512);
        assert_eq!(
            config.llm.temperature_overrides.get("kpis").copied(),
            Some(0.0)
        );
        // Unset fields keep defaults
        assert_eq!(config.ocr.model, "prebuilt-read");
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from_file(&dir.path().join("nope.toml")).unwrap();
        assert!(config.llm.deployment.is_empty());
    }

    #[test]
    fn test_starter_config_parses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("starter.toml");
        fs::write(&path, ConfigLoader::starter_config()).unwrap();
        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.ocr.model, "prebuilt-read");
    }
}
