//! Remote Document-Analysis OCR Client
//!
//! Speaks the async submit-then-poll REST shape: POST the document bytes to
//! the analyze route, receive `202 Accepted` with an `Operation-Location`
//! header, then poll that URL until the operation reports `succeeded` or
//! `failed`, within a configured budget. Page lines are flattened into
//! ordered segments with provenance.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

use super::{OcrEngine, check_supported};
use crate::config::OcrConfig;
use crate::constants::ocr as ocr_constants;
use crate::types::{ExtractedText, FinsightError, RawDocument, Result, TextSegment};

pub struct RemoteOcrClient {
    endpoint: String,
    /// Stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_version: String,
    model: String,
    poll_interval: Duration,
    poll_timeout: Duration,
    client: reqwest::Client,
}

impl std::fmt::Debug for RemoteOcrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteOcrClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("model", &self.model)
            .finish()
    }
}

impl RemoteOcrClient {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            FinsightError::Config(
                "Missing OCR API key. Set FINSIGHT_OCR_API_KEY or \
                 AZURE_DOCUMENT_INTELLIGENCE_KEY."
                    .to_string(),
            )
        })?;

        url::Url::parse(&config.endpoint).map_err(|e| {
            FinsightError::Config(format!("Invalid OCR endpoint URL: {}", e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(ocr_constants::REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                FinsightError::ExtractionFailed(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: SecretString::from(api_key),
            api_version: config.api_version.clone(),
            model: config.model.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            poll_timeout: Duration::from_secs(config.poll_timeout_secs),
            client,
        })
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/formrecognizer/documentModels/{}:analyze?api-version={}",
            self.endpoint, self.model, self.api_version
        )
    }

    async fn submit(&self, document: &RawDocument) -> Result<String> {
        let response = self
            .client
            .post(self.analyze_url())
            .header("Ocp-Apim-Subscription-Key", self.api_key.expose_secret())
            .header("Content-Type", document.media_type())
            .body(document.bytes().to_vec())
            .send()
            .await
            .map_err(|e| FinsightError::ExtractionFailed(format!("submit failed: {}", e)))?;

        let status = response.status();
        if status.as_u16() != 202 {
            let body = response.text().await.unwrap_or_default();
            return Err(FinsightError::ExtractionFailed(format!(
                "analyze submission returned {}: {}",
                status,
                body.chars().take(300).collect::<String>()
            )));
        }

        response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                FinsightError::ExtractionFailed(
                    "analyze submission missing Operation-Location header".to_string(),
                )
            })
    }

    async fn poll(&self, operation_url: &str) -> Result<AnalyzeResult> {
        let started = Instant::now();

        loop {
            if started.elapsed() > self.poll_timeout {
                return Err(FinsightError::timeout(
                    "OCR result polling",
                    self.poll_timeout,
                ));
            }

            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(operation_url)
                .header("Ocp-Apim-Subscription-Key", self.api_key.expose_secret())
                .send()
                .await
                .map_err(|e| FinsightError::ExtractionFailed(format!("poll failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(FinsightError::ExtractionFailed(format!(
                    "poll returned {}: {}",
                    status,
                    body.chars().take(300).collect::<String>()
                )));
            }

            let operation: AnalyzeOperation = response.json().await.map_err(|e| {
                FinsightError::ExtractionFailed(format!("unparseable poll body: {}", e))
            })?;

            debug!(status = %operation.status, "OCR operation status");

            match operation.status.as_str() {
                "succeeded" => {
                    return operation.analyze_result.ok_or_else(|| {
                        FinsightError::ExtractionFailed(
                            "operation succeeded but carried no result".to_string(),
                        )
                    });
                }
                "failed" => {
                    let detail = operation
                        .error
                        .map(|e| e.message)
                        .unwrap_or_else(|| "no detail provided".to_string());
                    return Err(FinsightError::ExtractionFailed(format!(
                        "analysis failed: {}",
                        detail
                    )));
                }
                // notStarted / running keep polling
                _ => continue,
            }
        }
    }
}

#[async_trait]
impl OcrEngine for RemoteOcrClient {
    async fn extract(&self, document: &RawDocument) -> Result<ExtractedText> {
        check_supported(document)?;

        info!(
            media_type = document.media_type(),
            bytes = document.len(),
            "Submitting document for OCR analysis"
        );

        let operation_url = self.submit(document).await?;
        let result = self.poll(&operation_url).await?;

        let mut segments = Vec::new();
        for (page_idx, page) in result.pages.iter().enumerate() {
            let page_number = page.page_number.unwrap_or(page_idx as u32 + 1);
            for (line_idx, line) in page.lines.iter().enumerate() {
                segments.push(TextSegment::new(
                    page_number,
                    line_idx as u32 + 1,
                    line.content.clone(),
                ));
            }
        }

        if segments.is_empty() {
            return Err(FinsightError::ExtractionFailed(
                "service returned no text lines".to_string(),
            ));
        }

        info!(
            pages = result.pages.len(),
            lines = segments.len(),
            "OCR extraction complete"
        );

        Ok(ExtractedText::new(segments))
    }

    fn name(&self) -> &str {
        "remote-document-analysis"
    }
}

// Wire types for the analyze operation

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: String,
    analyze_result: Option<AnalyzeResult>,
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    message: String,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct AnalyzeResult {
    #[serde(default)]
    pages: Vec<AnalyzePage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzePage {
    page_number: Option<u32>,
    #[serde(default)]
    lines: Vec<AnalyzeLine>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeLine {
    content: String,
}
