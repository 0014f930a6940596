//! Analysis Orchestrator
//!
//! Sequences the analyze half of the pipeline: fingerprint, consult the
//! session cache, claim the in-flight slot, call the gateway, record the
//! result. Identical requests against the same state perform exactly one
//! network call; failures leave state untouched so a later retry can
//! succeed.
//!
//! Custom reports fan an ordered section list out with bounded concurrency.
//! `StreamExt::buffered` keeps outputs in caller order regardless of
//! completion order, and per-section outcomes mean one failed section never
//! aborts its siblings.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use tracing::{debug, info};

use super::state::PipelineState;
use crate::ai::ModelGateway;
use crate::ai::prompt;
use crate::constants::report as report_constants;
use crate::types::{
    AnalysisKind, AnalysisRequest, AnalysisResult, CleanedText, FinsightError, Parameters, Result,
    TokenUsage,
};

/// Delay between cache re-checks while another call holds the slot
const IN_FLIGHT_WAIT: Duration = Duration::from_millis(50);

// =============================================================================
// Section Requests
// =============================================================================

/// One section of a custom report: a leaf kind plus its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRequest {
    pub kind: AnalysisKind,
    pub parameters: Parameters,
}

impl SectionRequest {
    pub fn summary() -> Self {
        Self {
            kind: AnalysisKind::Summary,
            parameters: Parameters::new(),
        }
    }

    pub fn kpis() -> Self {
        Self {
            kind: AnalysisKind::KpiTable,
            parameters: Parameters::new(),
        }
    }

    pub fn thematic(theme: &str) -> Self {
        let mut parameters = Parameters::new();
        parameters.insert("theme".to_string(), theme.to_string());
        Self {
            kind: AnalysisKind::Thematic,
            parameters,
        }
    }

    /// Parse a section spec: `summary`, `kpis`, or `theme:<name>`
    pub fn parse(spec: &str) -> std::result::Result<Self, String> {
        let spec = spec.trim();
        if let Some(theme) = spec.strip_prefix("theme:") {
            let theme = theme.trim();
            if theme.is_empty() {
                return Err("theme: section needs a theme name".to_string());
            }
            return Ok(Self::thematic(theme));
        }
        match spec.to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::summary()),
            "kpis" | "kpi" => Ok(Self::kpis()),
            other => Err(format!(
                "Unknown section '{}'. Valid: summary, kpis, theme:<name>",
                other
            )),
        }
    }

    /// Parse a comma-separated section list
    pub fn parse_list(specs: &str) -> std::result::Result<Vec<Self>, String> {
        let sections: Vec<Self> = specs
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(Self::parse)
            .collect::<std::result::Result<_, _>>()?;
        if sections.is_empty() {
            return Err("no sections requested".to_string());
        }
        Ok(sections)
    }

    /// Section heading for assembled reports
    pub fn title(&self) -> String {
        match self.kind {
            AnalysisKind::Summary => "Executive Summary".to_string(),
            AnalysisKind::KpiTable => "Key Metrics and KPIs".to_string(),
            AnalysisKind::Thematic => self
                .parameters
                .get("theme")
                .cloned()
                .unwrap_or_else(|| "Thematic Analysis".to_string()),
            AnalysisKind::CustomReport => "Report".to_string(),
        }
    }

    /// Encode back to the textual form used in parameters maps
    fn encode(&self) -> String {
        match self.kind {
            AnalysisKind::Thematic => format!(
                "theme:{}",
                self.parameters.get("theme").map(String::as_str).unwrap_or("")
            ),
            other => other.slug().to_string(),
        }
    }
}

/// Per-section success-or-error record from a custom report batch
#[derive(Debug)]
pub struct SectionOutcome {
    pub request: SectionRequest,
    pub result: Result<AnalysisResult>,
}

// =============================================================================
// Orchestrator
// =============================================================================

pub struct AnalysisOrchestrator {
    gateway: Arc<ModelGateway>,
    max_concurrent: usize,
}

impl AnalysisOrchestrator {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        Self {
            gateway,
            max_concurrent: report_constants::MAX_CONCURRENT_SECTIONS,
        }
    }

    pub fn with_concurrency(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Run one analysis, reusing the session cache when possible.
    ///
    /// `CustomReport` expands the `sections` parameter into leaf sections
    /// and aggregates their outcomes; leaf kinds map to a single (possibly
    /// cached) gateway call.
    pub async fn run(
        &self,
        kind: AnalysisKind,
        text: &CleanedText,
        parameters: &Parameters,
        state: &PipelineState,
    ) -> Result<AnalysisResult> {
        match kind {
            AnalysisKind::CustomReport => {
                let specs = parameters.get("sections").cloned().unwrap_or_default();
                let sections = SectionRequest::parse_list(&specs)
                    .map_err(FinsightError::Config)?;
                let outcomes = self.run_sections(&sections, text, state).await;
                Ok(aggregate_report(&outcomes))
            }
            _ => self.run_leaf(kind, text, parameters, state).await,
        }
    }

    /// Run an ordered section list with bounded concurrency.
    ///
    /// Outcomes come back in caller order regardless of completion order; a
    /// failed section is reported in place while siblings proceed.
    pub async fn run_sections(
        &self,
        sections: &[SectionRequest],
        text: &CleanedText,
        state: &PipelineState,
    ) -> Vec<SectionOutcome> {
        info!(
            sections = sections.len(),
            max_concurrent = self.max_concurrent,
            "Dispatching report sections"
        );

        stream::iter(sections.iter().cloned())
            .map(|section| async move {
                let result = self
                    .run_leaf(section.kind, text, &section.parameters, state)
                    .await;
                SectionOutcome {
                    request: section,
                    result,
                }
            })
            .buffered(self.max_concurrent)
            .collect()
            .await
    }

    async fn run_leaf(
        &self,
        kind: AnalysisKind,
        text: &CleanedText,
        parameters: &Parameters,
        state: &PipelineState,
    ) -> Result<AnalysisResult> {
        let request = AnalysisRequest::new(kind, text.clone(), parameters.clone());
        let fingerprint = request.fingerprint();

        loop {
            if let Some(cached) = state.get(&fingerprint) {
                debug!(kind = %kind, %fingerprint, "Cache hit, no network call");
                return Ok(cached);
            }

            match state.try_begin(&fingerprint) {
                Some(_guard) => {
                    // Re-check: the previous holder may have finished between
                    // the cache read and the claim
                    if let Some(cached) = state.get(&fingerprint) {
                        return Ok(cached);
                    }

                    // Guard drops on error, releasing the slot with state
                    // untouched so the same fingerprint can be retried
                    let result = self.gateway.generate(&request).await?;
                    state.insert(fingerprint.clone(), result.clone());
                    return Ok(result);
                }
                None => {
                    debug!(%fingerprint, "Waiting on in-flight call for same fingerprint");
                    tokio::time::sleep(IN_FLIGHT_WAIT).await;
                }
            }
        }
    }
}

/// Build the composite result for a custom report.
///
/// Content is the Markdown assembly of section outcomes; usage and cost are
/// the exact totals of the succeeded sections. The composite itself is never
/// written to pipeline state - its leaf sections already are, and recording
/// it again would double-count cost.
fn aggregate_report(outcomes: &[SectionOutcome]) -> AnalysisResult {
    let mut content = String::new();
    let mut usage = TokenUsage::default();
    let mut cost_usd = 0.0;
    let mut elapsed_ms = 0;
    let mut model = String::new();

    for outcome in outcomes {
        content.push_str(&format!("## {}\n\n", outcome.request.title()));
        match &outcome.result {
            Ok(result) => {
                content.push_str(result.content.trim());
                content.push_str("\n\n");
                usage = usage.add(&result.usage);
                cost_usd += result.cost_usd;
                elapsed_ms += result.elapsed_ms;
                if model.is_empty() {
                    model = result.model.clone();
                }
            }
            Err(err) => {
                content.push_str(&format!("_Section unavailable: {}_\n\n", err));
            }
        }
    }

    AnalysisResult {
        kind: AnalysisKind::CustomReport,
        content,
        usage,
        cost_usd,
        model,
        elapsed_ms,
    }
}

/// Convenience: parameters map for a custom report over `sections`
pub fn report_parameters(sections: &[SectionRequest]) -> Parameters {
    let mut parameters = Parameters::new();
    parameters.insert(
        "sections".to_string(),
        sections
            .iter()
            .map(SectionRequest::encode)
            .collect::<Vec<_>>()
            .join(","),
    );
    parameters
}

/// Sections mirroring the full built-in report (summary, KPIs, all themes)
pub fn full_report_sections() -> Vec<SectionRequest> {
    let mut sections = vec![SectionRequest::summary(), SectionRequest::kpis()];
    sections.extend(prompt::THEMES.iter().map(|theme| SectionRequest::thematic(theme)));
    sections
}

// =============================================================================
// Tests
// =============================================================================
