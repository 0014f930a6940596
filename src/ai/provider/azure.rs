//! Azure-Style Chat Completions Provider
//!
//! Speaks the deployment-scoped chat-completions dialect: the model is
//! addressed by deployment name in the path, the credential travels in the
//! `api-key` header, and the API version is a query parameter.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatCompletion, ChatProvider, ChatRequest};
use crate::types::{ErrorClassifier, GatewayError, GatewayErrorKind, TokenUsage};

/// Chat provider with secure API key handling
pub struct AzureChatProvider {
    endpoint: String,
    /// Stored securely - never exposed in logs or debug output
    api_key: SecretString,
    deployment: String,
    api_version: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AzureChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureChatProvider")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl AzureChatProvider {
    /// Build a provider.
    ///
    /// `request_timeout` is an upper transport bound; the gateway applies the
    /// tighter per-kind budget around each call.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let endpoint = endpoint.into();
        url::Url::parse(&endpoint).map_err(|e| {
            GatewayError::new(
                GatewayErrorKind::Transient,
                format!("invalid endpoint URL: {}", e),
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| {
                GatewayError::new(
                    GatewayErrorKind::Transient,
                    format!("failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: SecretString::from(api_key.into()),
            deployment: deployment.into(),
            api_version: api_version.into(),
            client,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }

    fn build_body(&self, request: &ChatRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user.clone(),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl ChatProvider for AzureChatProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, GatewayError> {
        debug!(
            deployment = %self.deployment,
            temperature = request.temperature,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .header("api-key", self.api_key.expose_secret())
            .header("Content-Type", "application/json")
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(ErrorClassifier::parse_retry_after);

            let body = response.text().await.unwrap_or_default();
            let mut err = ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("backend returned {}: {}", status, truncate(&body, 300)),
            );
            if let Some(delay) = retry_after {
                err = err.retry_after(delay);
            }
            return Err(err);
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            GatewayError::new(
                GatewayErrorKind::InvalidResponse,
                format!("unparseable completion body: {}", e),
            )
        })?;

        let content = body
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| {
                GatewayError::new(
                    GatewayErrorKind::InvalidResponse,
                    "completion contained no content",
                )
            })?;

        let usage = body
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(ChatCompletion { content, usage })
    }

    fn name(&self) -> &str {
        "azure-openai"
    }

    fn deployment(&self) -> &str {
        &self.deployment
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// Request/Response wire types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}
