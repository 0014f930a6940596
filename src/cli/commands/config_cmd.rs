//! Config Command
//!
//! Shows, locates, and initializes configuration. Credential values never
//! reach the terminal; only their presence is reported.

use crate::cli::output::Output;
use crate::config::ConfigLoader;
use crate::types::{FinsightError, Result};

pub fn show() -> Result<()> {
    let out = Output::new();
    let config = ConfigLoader::load()?;

    out.section("Merged configuration");
    // api_key fields are skip_serializing, so the dump is credential-free
    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| FinsightError::Config(format!("Failed to render config: {}", e)))?;
    println!("{}", rendered);

    out.section("Credentials");
    print_presence("llm.api_key", config.llm.api_key.is_some());
    print_presence("ocr.api_key", config.ocr.api_key.is_some());

    Ok(())
}

pub fn path() -> Result<()> {
    println!("Configuration paths:");
    if let Some(global) = ConfigLoader::global_config_path() {
        println!(
            "  global:  {} {}",
            global.display(),
            exists_marker(global.exists())
        );
    }
    let project = ConfigLoader::project_config_path();
    println!(
        "  project: {} {}",
        project.display(),
        exists_marker(project.exists())
    );
    Ok(())
}

pub fn init(force: bool) -> Result<()> {
    let out = Output::new();
    let path = ConfigLoader::init_project(force)?;
    out.success(&format!("Wrote starter config to {}", path.display()));
    out.info("Set FINSIGHT_LLM_API_KEY and FINSIGHT_OCR_API_KEY in the environment");
    Ok(())
}

fn print_presence(name: &str, set: bool) {
    let state = if set { "[set]" } else { "[not set]" };
    println!("  {:<14} {}", name, state);
}

fn exists_marker(exists: bool) -> &'static str {
    if exists { "(exists)" } else { "(missing)" }
}
