//! Finsight - AI-Powered Financial Report Analysis Pipeline
//!
//! Ingests a scanned or typed financial report, extracts text through an OCR
//! collaborator, repairs the extracted text with deterministic normalization
//! rules, and produces structured insights (executive summaries, KPI tables,
//! thematic analyses) by orchestrating a language-model backend - with
//! session caching, cost/token accounting, classified retries, and export to
//! Markdown, DOCX, or PDF.
//!
//! ## Core Features
//!
//! - **Pure Text Normalization**: deterministic OCR artifact repair
//! - **Fingerprint Caching**: at most one model call per unique request
//! - **Classified Failures**: rate limits retried with backoff, credential
//!   problems surfaced immediately with remediation guidance
//! - **Bounded Concurrency**: custom report sections fan out (≤4 calls)
//!   while the assembled order stays the caller's
//! - **Cost Accounting**: per-call exact costs summed across the session
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use finsight::ai::{AzureChatProvider, ModelGateway};
//! use finsight::normalize::normalize;
//! use finsight::pipeline::{AnalysisOrchestrator, PipelineState};
//! use finsight::types::{AnalysisKind, Parameters};
//!
//! let cleaned = normalize(&extracted);
//! let gateway = ModelGateway::new(Arc::new(provider), config.llm.clone());
//! let orchestrator = AnalysisOrchestrator::new(Arc::new(gateway));
//! let state = PipelineState::new();
//! let summary = orchestrator
//!     .run(AnalysisKind::Summary, &cleaned, &Parameters::new(), &state)
//!     .await?;
//! ```
//!
//! ## Modules
//!
//! - [`ocr`]: extraction collaborators (remote service + demo sample)
//! - [`normalize`]: pure OCR text repair
//! - [`ai`]: prompts, generation policy, pricing, validation, gateway
//! - [`pipeline`]: session state and the orchestrator
//! - [`report`]: document tree assembly and Markdown/DOCX/PDF rendering
//! - [`config`]: layered configuration with credential redaction

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod normalize;
pub mod ocr;
pub mod pipeline;
pub mod report;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{FinsightError, GatewayError, GatewayErrorKind, Result};

// Data Model
pub use types::{
    AnalysisKind, AnalysisRequest, AnalysisResult, CleanedText, ExtractedText, Fingerprint,
    Parameters, RawDocument, TextSegment, TokenUsage,
};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use normalize::normalize;
pub use pipeline::{
    AnalysisOrchestrator, PipelineState, SectionOutcome, SectionRequest, full_report_sections,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    AzureChatProvider, ChatProvider, CostEstimator, ModelGateway, PriceTable, RetryConfig,
    SharedProvider, THEMES,
};

// =============================================================================
// Report Re-exports
// =============================================================================

pub use report::{Block, ExportFormat, ReportDocument, assemble, render};
