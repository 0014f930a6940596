//! Chat Backend Abstraction
//!
//! Defines the `ChatProvider` trait for text generation against a
//! chat-completion backend. Providers return raw content plus token usage;
//! classification, retries, validation, and cost accounting live in the
//! gateway, so a provider only has to speak its wire protocol.

mod azure;

pub use azure::AzureChatProvider;

use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{GatewayError, TokenUsage};

// =============================================================================
// Request / Completion
// =============================================================================

/// One generation request: system role + user content + parameters
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Raw backend completion with usage metrics
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub content: String,
    pub usage: TokenUsage,
}

// =============================================================================
// Chat Provider Trait
// =============================================================================

/// Chat-completion backend
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Generate a completion, or fail with a classified gateway error
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, GatewayError>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Deployment/model identifier in use
    fn deployment(&self) -> &str;
}

/// Shared provider handle for concurrent pipeline stages
pub type SharedProvider = Arc<dyn ChatProvider>;
