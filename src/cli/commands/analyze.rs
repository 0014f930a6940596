//! Analyze Command
//!
//! Runs the pipeline for a single analysis kind: extract, clean, analyze,
//! print. `--show-text` stops after cleaning with no model call.

use std::path::PathBuf;

use crate::ai::is_known_theme;
use crate::cli::output::Output;
use crate::cli::{build_orchestrator, extract_and_clean};
use crate::config::ConfigLoader;
use crate::pipeline::PipelineState;
use crate::types::{AnalysisKind, Parameters, Result};

pub struct AnalyzeOptions {
    pub file: Option<PathBuf>,
    pub kind: AnalysisKind,
    pub theme: Option<String>,
    pub demo: bool,
    pub show_text: bool,
    pub show_raw: bool,
}

pub async fn run(options: AnalyzeOptions) -> Result<()> {
    let out = Output::new();
    let config = ConfigLoader::load()?;

    let session = extract_and_clean(&config, options.file.as_deref(), options.demo).await?;
    out.success(&format!(
        "Extracted {} pages, {} characters after cleaning",
        session.raw.page_count(),
        session.cleaned.len()
    ));
    if session.cleaned.is_degraded() {
        out.warning("Cleaning could not fully normalize the text; continuing with best effort");
    }

    if options.show_text {
        out.section("Cleaned text");
        println!("{}", session.cleaned);
        if options.show_raw {
            out.section("Raw OCR text");
            println!("{}", session.raw.raw_text());
        }
        return Ok(());
    }

    let mut parameters = Parameters::new();
    if let Some(theme) = &options.theme {
        if !is_known_theme(theme) {
            out.warning(&format!(
                "'{}' is not a built-in theme (finsight themes lists them); analyzing anyway",
                theme
            ));
        }
        parameters.insert("theme".to_string(), theme.clone());
    }

    let orchestrator = build_orchestrator(&config)?;
    let state = PipelineState::new();

    out.info(&format!("Running {} analysis…", options.kind));
    let result = orchestrator
        .run(options.kind, &session.cleaned, &parameters, &state)
        .await?;

    out.section(&section_title(options.kind, options.theme.as_deref()));
    println!("{}", result.content.trim());
    println!();
    out.cost(
        result.usage.prompt_tokens,
        result.usage.completion_tokens,
        result.cost_usd,
        state.cumulative_cost(),
    );

    Ok(())
}

fn section_title(kind: AnalysisKind, theme: Option<&str>) -> String {
    match kind {
        AnalysisKind::Summary => "Executive Summary".to_string(),
        AnalysisKind::KpiTable => "Key Metrics and KPIs".to_string(),
        AnalysisKind::Thematic => theme.unwrap_or("Thematic Analysis").to_string(),
        AnalysisKind::CustomReport => "Report".to_string(),
    }
}
