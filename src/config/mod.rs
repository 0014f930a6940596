//! Configuration
//!
//! Layered configuration (defaults, global file, project file, environment)
//! with fail-fast validation and credential redaction.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{Config, ExportConfig, LlmConfig, OcrConfig, default_timeout_secs};
