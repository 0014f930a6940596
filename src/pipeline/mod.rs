//! Analysis Pipeline
//!
//! Session state and the orchestrator that drives analyses against it.

mod orchestrator;
mod state;

pub use orchestrator::{
    AnalysisOrchestrator, SectionOutcome, SectionRequest, full_report_sections, report_parameters,
};
pub use state::{InFlightGuard, PipelineState};
