//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Gateway errors carry a kind tag so retry and surfacing decisions are
//! data-driven instead of control-flow-via-exceptions.
//!
//! ## Gateway Error Kinds
//!
//! - **RateLimited**: upstream throttling (wait and retry)
//! - **Unauthorized**: credential rejected (fail fast)
//! - **DeploymentNotFound**: model/deployment name wrong (fail fast)
//! - **Timeout**: request exceeded its per-kind budget (surfaced, not retried)
//! - **Transient**: temporary server/network trouble (retry with backoff)
//! - **InvalidResponse**: output failed the kind's shape contract (never cached)
//!
//! ## Design Principles
//!
//! - Single application error type (`FinsightError`) across the crate
//! - Every fatal variant can produce remediation guidance for the user
//! - Credential values never appear in any message

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Gateway Error Kinds
// =============================================================================

/// Failure kinds for language-model backend calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// Upstream rate limiting - wait then retry
    RateLimited,
    /// Credential rejected - fail fast, don't retry
    Unauthorized,
    /// Deployment/model identifier unknown to the backend - fail fast
    DeploymentNotFound,
    /// Request exceeded its timeout budget
    Timeout,
    /// Temporary server or network trouble - retry with backoff
    Transient,
    /// Response did not match the expected output contract
    InvalidResponse,
}

impl std::fmt::Display for GatewayErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimited => write!(f, "RATE_LIMITED"),
            Self::Unauthorized => write!(f, "UNAUTHORIZED"),
            Self::DeploymentNotFound => write!(f, "DEPLOYMENT_NOT_FOUND"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::InvalidResponse => write!(f, "INVALID_RESPONSE"),
        }
    }
}

impl GatewayErrorKind {
    /// Check if this kind is retryable on the same backend
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Transient)
    }

    /// Check if this kind is fatal for the session (retrying cannot succeed)
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::DeploymentNotFound)
    }

    /// Get recommended retry delay for this kind
    pub fn recommended_delay(&self) -> Duration {
        match self {
            Self::RateLimited => Duration::from_secs(30),
            Self::Transient => Duration::from_secs(2),
            _ => Duration::from_millis(500),
        }
    }
}

// =============================================================================
// Gateway Error
// =============================================================================

/// Classified language-model backend error with retry hints
#[derive(Debug, Clone)]
pub struct GatewayError {
    /// Error kind for retry and surfacing decisions
    pub kind: GatewayErrorKind,
    /// Detailed error message (credential-free)
    pub message: String,
    /// Suggested wait time before retry (from Retry-After when available)
    pub retry_after: Option<Duration>,
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl GatewayError {
    /// Create a new gateway error
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Add suggested retry delay
    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    /// Check if error is retryable on the same backend
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Get recommended retry delay
    pub fn recommended_delay(&self) -> Duration {
        self.retry_after
            .unwrap_or_else(|| self.kind.recommended_delay())
    }

    /// Remediation guidance for user-visible surfacing
    pub fn remediation(&self) -> &'static str {
        match self.kind {
            GatewayErrorKind::RateLimited => {
                "The model backend is throttling requests. Wait a moment and try again."
            }
            GatewayErrorKind::Unauthorized => {
                "The API credential was rejected. Check the configured API key \
                 (FINSIGHT_LLM_API_KEY or AZURE_OPENAI_API_KEY)."
            }
            GatewayErrorKind::DeploymentNotFound => {
                "The deployment/model identifier was not found. Check the configured \
                 deployment name against your backend's deployed models."
            }
            GatewayErrorKind::Timeout => {
                "The request exceeded its time budget. Try again, or raise the per-kind \
                 timeout override in the configuration."
            }
            GatewayErrorKind::Transient => {
                "The model backend had a temporary problem. Try again later."
            }
            GatewayErrorKind::InvalidResponse => {
                "The model returned output that did not match the expected shape. \
                 Re-running the analysis usually resolves this."
            }
        }
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps HTTP-level outcomes onto gateway error kinds
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an HTTP status code from the model backend
    pub fn classify_http_status(status: u16, message: &str) -> GatewayError {
        match status {
            429 => GatewayError::new(GatewayErrorKind::RateLimited, message)
                .retry_after(Duration::from_secs(30)),
            401 | 403 => GatewayError::new(GatewayErrorKind::Unauthorized, message),
            404 => GatewayError::new(GatewayErrorKind::DeploymentNotFound, message),
            408 | 500 | 502 | 503 | 504 => GatewayError::new(GatewayErrorKind::Transient, message)
                .retry_after(Duration::from_secs(5)),
            _ => GatewayError::new(GatewayErrorKind::Transient, message),
        }
    }

    /// Classify a transport-level failure from the HTTP client
    pub fn classify_transport(err: &reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::new(
                GatewayErrorKind::Timeout,
                format!("request timed out: {}", err),
            )
        } else {
            GatewayError::new(
                GatewayErrorKind::Transient,
                format!("transport error: {}", err),
            )
            .retry_after(Duration::from_secs(5))
        }
    }

    /// Parse a Retry-After header value (seconds form only)
    pub fn parse_retry_after(value: &str) -> Option<Duration> {
        value
            .trim()
            .parse::<u64>()
            .ok()
            .map(|secs| Duration::from_secs(secs.min(300)))
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum FinsightError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Extraction Errors
    // -------------------------------------------------------------------------
    /// Document media type the OCR collaborator cannot handle
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// OCR collaborator failed to produce text
    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),

    // -------------------------------------------------------------------------
    // Model Backend Errors
    // -------------------------------------------------------------------------
    /// Classified language-model backend error
    #[error("Model backend error: {0}")]
    Gateway(GatewayError),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Export failed: {0}")]
    Export(String),

    /// Operation timeout outside the model gateway (e.g. OCR polling)
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },
}

impl From<GatewayError> for FinsightError {
    fn from(err: GatewayError) -> Self {
        FinsightError::Gateway(err)
    }
}

impl FinsightError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Check if this error is recoverable by simply retrying
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Gateway(e) => e.is_retryable(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Remediation guidance for user-visible surfacing.
    ///
    /// Fatal conditions (extraction, configuration, auth) get specific
    /// next steps; transient ones get a plain try-again message.
    pub fn remediation(&self) -> String {
        match self {
            Self::UnsupportedFormat(_) => {
                "Supported formats: PDF, PNG, JPEG, TIFF. Convert the document first.".to_string()
            }
            Self::ExtractionFailed(_) => {
                "Check the OCR endpoint and key (FINSIGHT_OCR_ENDPOINT / \
                 AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT), or use --demo to try the \
                 pipeline without OCR."
                    .to_string()
            }
            Self::Config(_) => {
                "Run `finsight config init` to create a config file, or set the \
                 documented environment variables."
                    .to_string()
            }
            Self::Gateway(e) => e.remediation().to_string(),
            Self::Export(_) => "Check the output path is writable and try again.".to_string(),
            Self::Timeout { .. } => "The operation ran out of time. Try again.".to_string(),
            Self::Io(_) | Self::Json(_) => "Try again; report a bug if it persists.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FinsightError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(GatewayErrorKind::RateLimited.to_string(), "RATE_LIMITED");
        assert_eq!(
            GatewayErrorKind::DeploymentNotFound.to_string(),
            "DEPLOYMENT_NOT_FOUND"
        );
        assert_eq!(
            GatewayErrorKind::InvalidResponse.to_string(),
            "INVALID_RESPONSE"
        );
    }

    #[test]
    fn test_kind_retryable() {
        assert!(GatewayErrorKind::RateLimited.is_retryable());
        assert!(GatewayErrorKind::Transient.is_retryable());
        assert!(!GatewayErrorKind::Unauthorized.is_retryable());
        assert!(!GatewayErrorKind::DeploymentNotFound.is_retryable());
        assert!(!GatewayErrorKind::Timeout.is_retryable());
        assert!(!GatewayErrorKind::InvalidResponse.is_retryable());
    }

    #[test]
    fn test_kind_fatal() {
        assert!(GatewayErrorKind::Unauthorized.is_fatal());
        assert!(GatewayErrorKind::DeploymentNotFound.is_fatal());
        assert!(!GatewayErrorKind::RateLimited.is_fatal());
        assert!(!GatewayErrorKind::InvalidResponse.is_fatal());
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = ErrorClassifier::classify_http_status(429, "Too many requests");
        assert_eq!(err.kind, GatewayErrorKind::RateLimited);
        assert!(err.is_retryable());
        assert!(err.retry_after.is_some());
    }

    #[test]
    fn test_classify_auth() {
        let err = ErrorClassifier::classify_http_status(401, "Access denied");
        assert_eq!(err.kind, GatewayErrorKind::Unauthorized);
        assert!(!err.is_retryable());

        let forbidden = ErrorClassifier::classify_http_status(403, "Forbidden");
        assert_eq!(forbidden.kind, GatewayErrorKind::Unauthorized);
    }

    #[test]
    fn test_classify_deployment() {
        let err = ErrorClassifier::classify_http_status(404, "Resource not found");
        assert_eq!(err.kind, GatewayErrorKind::DeploymentNotFound);
        assert!(err.kind.is_fatal());
    }

    #[test]
    fn test_classify_server_errors() {
        for status in [408, 500, 502, 503, 504] {
            let err = ErrorClassifier::classify_http_status(status, "server trouble");
            assert_eq!(err.kind, GatewayErrorKind::Transient, "status {}", status);
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn test_classify_unknown_status_is_transient() {
        let err = ErrorClassifier::classify_http_status(418, "teapot");
        assert_eq!(err.kind, GatewayErrorKind::Transient);
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(
            ErrorClassifier::parse_retry_after("12"),
            Some(Duration::from_secs(12))
        );
        // Capped at 5 minutes
        assert_eq!(
            ErrorClassifier::parse_retry_after("9000"),
            Some(Duration::from_secs(300))
        );
        // HTTP-date form is not parsed
        assert_eq!(
            ErrorClassifier::parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"),
            None
        );
    }

    #[test]
    fn test_recommended_delay() {
        let rate_limit = GatewayError::new(GatewayErrorKind::RateLimited, "test");
        assert!(rate_limit.recommended_delay() >= Duration::from_secs(30));

        let custom = GatewayError::new(GatewayErrorKind::Transient, "test")
            .retry_after(Duration::from_secs(100));
        assert_eq!(custom.recommended_delay(), Duration::from_secs(100));
    }

    #[test]
    fn test_gateway_error_display() {
        let err = GatewayError::new(GatewayErrorKind::RateLimited, "Too many requests");
        assert_eq!(err.to_string(), "[RATE_LIMITED] Too many requests");
    }

    #[test]
    fn test_remediation_names_variable_not_value() {
        let err = FinsightError::Gateway(GatewayError::new(
            GatewayErrorKind::Unauthorized,
            "credential rejected",
        ));
        assert!(err.remediation().contains("API key"));
    }

    #[test]
    fn test_recoverable() {
        assert!(
            FinsightError::Gateway(GatewayError::new(GatewayErrorKind::Transient, "x"))
                .is_recoverable()
        );
        assert!(!FinsightError::Config("missing".to_string()).is_recoverable());
        assert!(!FinsightError::UnsupportedFormat("text/csv".to_string()).is_recoverable());
    }
}
