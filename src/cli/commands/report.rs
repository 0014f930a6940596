//! Report Command
//!
//! Builds a custom report: ordered sections dispatched with bounded
//! concurrency, assembled into the format-neutral tree, rendered, and
//! written to disk. A failed section becomes a placeholder; the export
//! still happens.

use std::path::PathBuf;

use crate::cli::output::Output;
use crate::cli::{build_orchestrator, extract_and_clean};
use crate::config::ConfigLoader;
use crate::pipeline::{PipelineState, SectionRequest, full_report_sections};
use crate::report::{ExportFormat, assemble, render};
use crate::types::{FinsightError, Result};

pub struct ReportOptions {
    pub file: Option<PathBuf>,
    /// Comma-separated section specs; `None` with `all` selects everything
    pub sections: Option<String>,
    pub all: bool,
    pub format: ExportFormat,
    pub output: Option<PathBuf>,
    pub demo: bool,
}

pub async fn run(options: ReportOptions) -> Result<()> {
    let out = Output::new();
    let config = ConfigLoader::load()?;

    let sections = resolve_sections(&options)?;

    let session = extract_and_clean(&config, options.file.as_deref(), options.demo).await?;
    if session.cleaned.is_degraded() {
        out.warning("Cleaning could not fully normalize the text; continuing with best effort");
    }

    let orchestrator = build_orchestrator(&config)?;
    let state = PipelineState::new();

    out.info(&format!(
        "Generating {} section(s)… this may take a moment",
        sections.len()
    ));
    let outcomes = orchestrator
        .run_sections(&sections, &session.cleaned, &state)
        .await;

    for outcome in &outcomes {
        match &outcome.result {
            Ok(_) => out.success(&outcome.request.title()),
            Err(err) => out.warning(&format!(
                "{}: {} (placeholder rendered)",
                outcome.request.title(),
                err
            )),
        }
    }

    let document = assemble(&config.export.report_title, &outcomes);
    let bytes = render(&document, options.format)?;

    let path = output_path(&options, &config.export.output_dir);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &bytes)?;

    let usage = state.cumulative_usage();
    out.success(&format!(
        "Report written to {} ({} bytes)",
        path.display(),
        bytes.len()
    ));
    out.cost(
        usage.prompt_tokens,
        usage.completion_tokens,
        state.cumulative_cost(),
        state.cumulative_cost(),
    );

    Ok(())
}

fn resolve_sections(options: &ReportOptions) -> Result<Vec<SectionRequest>> {
    if options.all {
        return Ok(full_report_sections());
    }
    match &options.sections {
        Some(specs) => SectionRequest::parse_list(specs).map_err(FinsightError::Config),
        None => Err(FinsightError::Config(
            "Select sections with --sections \"summary,kpis,theme:<name>\" or pass --all"
                .to_string(),
        )),
    }
}

fn output_path(options: &ReportOptions, output_dir: &str) -> PathBuf {
    match &options.output {
        Some(path) => path.clone(),
        None => PathBuf::from(output_dir).join(format!(
            "financial_report.{}",
            options.format.extension()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(sections: Option<&str>, all: bool) -> ReportOptions {
        ReportOptions {
            file: None,
            sections: sections.map(String::from),
            all,
            format: ExportFormat::Markdown,
            output: None,
            demo: true,
        }
    }

    #[test]
    fn test_resolve_sections_explicit() {
        let sections = resolve_sections(&options(Some("summary,kpis"), false)).unwrap();
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn test_resolve_sections_all() {
        let sections = resolve_sections(&options(None, true)).unwrap();
        assert_eq!(sections.len(), 10);
    }

    #[test]
    fn test_resolve_sections_missing_is_config_error() {
        let err = resolve_sections(&options(None, false)).unwrap_err();
        assert!(matches!(err, FinsightError::Config(_)));
    }

    #[test]
    fn test_default_output_path_uses_format_extension() {
        let mut opts = options(Some("summary"), false);
        opts.format = ExportFormat::Pdf;
        assert_eq!(
            output_path(&opts, "exports"),
            PathBuf::from("exports/financial_report.pdf")
        );
    }
}
