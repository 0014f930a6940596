//! CLI Surface
//!
//! Subcommand handlers and shared session plumbing. Each subcommand maps
//! 1:1 onto an orchestrator or renderer invocation; one document is
//! processed per session, with demo mode substituting the sample extractor
//! for the OCR collaborator.

pub mod commands;
pub mod output;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::ai::{AzureChatProvider, ModelGateway};
use crate::config::Config;
use crate::normalize::normalize;
use crate::ocr::{OcrEngine, RemoteOcrClient, SampleOcr};
use crate::pipeline::AnalysisOrchestrator;
use crate::types::{CleanedText, ExtractedText, RawDocument, Result};

/// Transport-level HTTP cap; per-kind budgets are tighter and win
const TRANSPORT_TIMEOUT: Duration = Duration::from_secs(300);

/// Extracted + cleaned document for one session
pub struct SessionText {
    pub raw: ExtractedText,
    pub cleaned: CleanedText,
}

/// Run the extract + clean half of the pipeline.
///
/// Demo mode needs neither a file nor OCR credentials; otherwise the file is
/// read and sent to the remote OCR collaborator.
pub async fn extract_and_clean(
    config: &Config,
    file: Option<&Path>,
    demo: bool,
) -> Result<SessionText> {
    let raw = if demo {
        info!("Demo mode: using the built-in sample report");
        SampleOcr::new()
            .extract(&RawDocument::new(Vec::new(), "application/pdf"))
            .await?
    } else {
        let path = file.ok_or_else(|| {
            crate::types::FinsightError::Config(
                "A document file is required (or pass --demo)".to_string(),
            )
        })?;
        config.require_ocr()?;

        let bytes = std::fs::read(path)?;
        let extension = path.extension().and_then(|e| e.to_str());
        let document = RawDocument::from_file_bytes(bytes, extension);

        let engine = RemoteOcrClient::new(&config.ocr)?;
        engine.extract(&document).await?
    };

    let cleaned = normalize(&raw);
    Ok(SessionText { raw, cleaned })
}

/// Build the orchestrator for this session's model backend
pub fn build_orchestrator(config: &Config) -> Result<AnalysisOrchestrator> {
    config.require_llm()?;

    let provider = AzureChatProvider::new(
        config.llm.endpoint.clone(),
        config.llm.api_key.clone().unwrap_or_default(),
        config.llm.deployment.clone(),
        config.llm.api_version.clone(),
        TRANSPORT_TIMEOUT,
    )?;

    let gateway = ModelGateway::new(Arc::new(provider), config.llm.clone());
    Ok(AnalysisOrchestrator::new(Arc::new(gateway)))
}
