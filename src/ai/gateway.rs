//! Model Gateway
//!
//! The single door to the language-model backend. Applies the per-kind
//! generation policy, wraps every call in its timeout budget, retries
//! transient failures with bounded exponential backoff and jitter, validates
//! the response shape, and fills in token usage and exact cost.
//!
//! The gateway never touches pipeline state - caching is the orchestrator's
//! concern - so a failed call leaves nothing behind.

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::policy::GenerationPolicy;
use super::pricing::CostEstimator;
use super::prompt;
use super::provider::{ChatRequest, SharedProvider};
use super::validation::validate_content;
use crate::config::LlmConfig;
use crate::constants::gateway as gateway_constants;
use crate::types::{AnalysisRequest, AnalysisResult, GatewayError, GatewayErrorKind};

// =============================================================================
// Retry Configuration
// =============================================================================

/// Bounded retry policy for transient failures
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts per request (first try + retries)
    pub max_attempts: u32,
    /// Base delay for exponential backoff
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier
    pub backoff_factor: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: gateway_constants::MAX_ATTEMPTS,
            base_delay: Duration::from_millis(gateway_constants::BASE_DELAY_MS),
            max_delay: Duration::from_secs(gateway_constants::MAX_DELAY_SECS),
            backoff_factor: gateway_constants::BACKOFF_FACTOR,
        }
    }
}

// =============================================================================
// Model Gateway
// =============================================================================

pub struct ModelGateway {
    provider: SharedProvider,
    llm_config: LlmConfig,
    estimator: CostEstimator,
    retry: RetryConfig,
}

impl ModelGateway {
    pub fn new(provider: SharedProvider, llm_config: LlmConfig) -> Self {
        Self {
            provider,
            llm_config,
            estimator: CostEstimator::default(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn estimator(&self) -> &CostEstimator {
        &self.estimator
    }

    /// Run one analysis request against the backend.
    ///
    /// RateLimited and Transient failures are retried with backoff up to the
    /// configured attempt bound; Unauthorized, DeploymentNotFound, Timeout,
    /// and InvalidResponse surface immediately.
    pub async fn generate(&self, request: &AnalysisRequest) -> Result<AnalysisResult, GatewayError> {
        let policy = GenerationPolicy::resolve(request.kind, &self.llm_config);
        let rendered = prompt::build(request.kind, &request.parameters, request.source.as_str());
        let profile = self
            .estimator
            .table()
            .lookup(self.llm_config.profile_name())
            .clone();

        let estimate = self
            .estimator
            .estimate(&rendered.user, &profile);
        debug!(
            kind = %request.kind,
            est_tokens = estimate.tokens,
            est_cost_usd = estimate.cost_usd,
            timeout_secs = policy.timeout.as_secs(),
            "Dispatching analysis request"
        );

        let chat_request = ChatRequest {
            system: rendered.system,
            user: rendered.user,
            temperature: policy.temperature,
            max_tokens: policy.max_tokens,
        };

        let start = Instant::now();
        let mut current_delay = self.retry.base_delay;

        for attempt in 1..=self.retry.max_attempts {
            let outcome =
                tokio::time::timeout(policy.timeout, self.provider.complete(&chat_request)).await;

            let err = match outcome {
                Err(_elapsed) => {
                    // Abandon the in-flight call; a hung backend must not
                    // hold the session hostage
                    return Err(GatewayError::new(
                        GatewayErrorKind::Timeout,
                        format!(
                            "{} request exceeded {}s budget",
                            request.kind,
                            policy.timeout.as_secs()
                        ),
                    ));
                }
                Ok(Ok(completion)) => {
                    validate_content(request.kind, &completion.content)?;

                    let cost_usd = self.estimator.cost_of_usage(&completion.usage, &profile);
                    let elapsed_ms = start.elapsed().as_millis() as u64;

                    info!(
                        kind = %request.kind,
                        attempt,
                        prompt_tokens = completion.usage.prompt_tokens,
                        completion_tokens = completion.usage.completion_tokens,
                        cost_usd,
                        "Analysis call succeeded"
                    );

                    return Ok(AnalysisResult {
                        kind: request.kind,
                        content: completion.content,
                        usage: completion.usage,
                        cost_usd,
                        model: self.provider.deployment().to_string(),
                        elapsed_ms,
                    });
                }
                Ok(Err(err)) => err,
            };

            if !err.is_retryable() || attempt == self.retry.max_attempts {
                warn!(
                    kind = %request.kind,
                    attempt,
                    error = %err,
                    "Analysis call failed"
                );
                return Err(err);
            }

            let wait = match err.kind {
                GatewayErrorKind::RateLimited => err.recommended_delay().min(self.retry.max_delay),
                _ => current_delay + random_jitter(current_delay),
            };
            debug!(
                kind = %request.kind,
                attempt,
                wait_ms = wait.as_millis() as u64,
                error = %err,
                "Retrying after backoff"
            );
            sleep(wait).await;
            current_delay = calculate_backoff(
                current_delay,
                self.retry.backoff_factor,
                self.retry.max_delay,
            );
        }

        // The loop always returns on its final attempt
        Err(GatewayError::new(
            GatewayErrorKind::Transient,
            "retry loop exhausted without a classified failure",
        ))
    }
}

/// Generate random jitter (up to a quarter of the base delay)
fn random_jitter(base_delay: Duration) -> Duration {
    let max_jitter_ms = (base_delay.as_millis() as u64) / 4;
    if max_jitter_ms == 0 {
        return Duration::ZERO;
    }
    let jitter_ms = rand::rng().random_range(0..max_jitter_ms);
    Duration::from_millis(jitter_ms)
}

/// Calculate exponential backoff with cap
fn calculate_backoff(current: Duration, factor: f32, max: Duration) -> Duration {
    let next = Duration::from_secs_f32(current.as_secs_f32() * factor);
    std::cmp::min(next, max)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{ChatCompletion, ChatProvider};
    use crate::types::{AnalysisKind, CleanedText, Parameters, TokenUsage};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    const KPI_TABLE: &str = "| Metric | Value | Period |\n\
                             |---|---|---|\n\
                             | Revenue | $45.2M | FY2024 |";

    const SUMMARY_TEXT: &str = "Revenue grew 23 percent to $45.2 million while operating \
                                margins expanded and free cash flow reached $9.8 million.";

    /// Scripted backend: fails with `failure` until `failures` calls have
    /// happened, then succeeds with `content`.
    struct MockProvider {
        calls: AtomicU32,
        failures: u32,
        failure: GatewayErrorKind,
        content: String,
        delay: Duration,
    }

    impl MockProvider {
        fn succeeding(content: &str) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures: 0,
                failure: GatewayErrorKind::Transient,
                content: content.to_string(),
                delay: Duration::ZERO,
            }
        }

        fn failing(kind: GatewayErrorKind) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures: u32::MAX,
                failure: kind,
                content: String::new(),
                delay: Duration::ZERO,
            }
        }

        fn flaky(kind: GatewayErrorKind, failures: u32, content: &str) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
                failure: kind,
                content: content.to_string(),
                delay: Duration::ZERO,
            }
        }

        fn slow(content: &str, delay: Duration) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures: 0,
                failure: GatewayErrorKind::Transient,
                content: content.to_string(),
                delay,
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatProvider for MockProvider {
        async fn complete(&self, _request: &ChatRequest) -> Result<ChatCompletion, GatewayError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            if call < self.failures {
                return Err(GatewayError::new(self.failure, "scripted failure"));
            }
            Ok(ChatCompletion {
                content: self.content.clone(),
                usage: TokenUsage::new(100, 50),
            })
        }

        fn name(&self) -> &str {
            "mock"
        }

        fn deployment(&self) -> &str {
            "gpt-4o-mini"
        }
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_factor: 2.0,
        }
    }

    fn gateway(provider: Arc<MockProvider>) -> ModelGateway {
        let mut config = LlmConfig::default();
        config.deployment = "gpt-4o-mini".to_string();
        ModelGateway::new(provider, config).with_retry(fast_retry())
    }

    fn request(kind: AnalysisKind) -> AnalysisRequest {
        AnalysisRequest::new(
            kind,
            CleanedText::new("Revenue grew to $45.2 million.".to_string(), false),
            Parameters::new(),
        )
    }

    #[tokio::test]
    async fn test_success_fills_usage_and_cost() {
        let provider = Arc::new(MockProvider::succeeding(SUMMARY_TEXT));
        let gw = gateway(provider.clone());

        let result = gw.generate(&request(AnalysisKind::Summary)).await.unwrap();

        assert_eq!(result.usage.prompt_tokens, 100);
        assert_eq!(result.usage.completion_tokens, 50);
        assert_eq!(result.model, "gpt-4o-mini");
        // gpt-4o-mini: 100/1000 * 0.00015 + 50/1000 * 0.0006
        let expected = 0.1 * 0.000_15 + 0.05 * 0.000_6;
        assert!((result.cost_usd - expected).abs() < 1e-12);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_retries_configured_count() {
        let provider = Arc::new(MockProvider::failing(GatewayErrorKind::RateLimited));
        let gw = gateway(provider.clone());

        let err = gw.generate(&request(AnalysisKind::Summary)).await.unwrap_err();

        assert_eq!(err.kind, GatewayErrorKind::RateLimited);
        // Exactly max_attempts calls: first try + two retries
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unauthorized_no_retries() {
        let provider = Arc::new(MockProvider::failing(GatewayErrorKind::Unauthorized));
        let gw = gateway(provider.clone());

        let err = gw.generate(&request(AnalysisKind::Summary)).await.unwrap_err();

        assert_eq!(err.kind, GatewayErrorKind::Unauthorized);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_deployment_not_found_no_retries() {
        let provider = Arc::new(MockProvider::failing(GatewayErrorKind::DeploymentNotFound));
        let gw = gateway(provider.clone());

        let err = gw.generate(&request(AnalysisKind::Summary)).await.unwrap_err();

        assert_eq!(err.kind, GatewayErrorKind::DeploymentNotFound);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_then_success() {
        let provider = Arc::new(MockProvider::flaky(
            GatewayErrorKind::Transient,
            2,
            SUMMARY_TEXT,
        ));
        let gw = gateway(provider.clone());

        let result = gw.generate(&request(AnalysisKind::Summary)).await;

        assert!(result.is_ok());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_invalid_kpi_shape_not_retried() {
        // Prose where a table was demanded
        let provider = Arc::new(MockProvider::succeeding(
            "Revenue was strong this year across all segments and regions worldwide.",
        ));
        let gw = gateway(provider.clone());

        let err = gw.generate(&request(AnalysisKind::KpiTable)).await.unwrap_err();

        assert_eq!(err.kind, GatewayErrorKind::InvalidResponse);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_valid_kpi_table_accepted() {
        let provider = Arc::new(MockProvider::succeeding(KPI_TABLE));
        let gw = gateway(provider.clone());

        let result = gw.generate(&request(AnalysisKind::KpiTable)).await.unwrap();
        assert!(result.content.contains("| Revenue |"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_surfaces() {
        let slow = Arc::new(MockProvider::slow(SUMMARY_TEXT, Duration::from_secs(600)));
        let mut config = LlmConfig::default();
        config.deployment = "gpt-4o-mini".to_string();
        config.timeout_overrides.insert("summary".to_string(), 1);

        let gw = ModelGateway::new(slow.clone(), config).with_retry(fast_retry());

        let err = gw.generate(&request(AnalysisKind::Summary)).await.unwrap_err();
        assert_eq!(err.kind, GatewayErrorKind::Timeout);
        // Timeouts are surfaced, not retried
        assert_eq!(slow.call_count(), 1);
    }

    #[test]
    fn test_calculate_backoff() {
        let next = calculate_backoff(Duration::from_millis(500), 2.0, Duration::from_secs(30));
        assert_eq!(next, Duration::from_secs(1));

        let capped = calculate_backoff(Duration::from_secs(25), 2.0, Duration::from_secs(30));
        assert_eq!(capped, Duration::from_secs(30));
    }

    #[test]
    fn test_random_jitter_bounds() {
        let base = Duration::from_millis(1000);
        for _ in 0..10 {
            assert!(random_jitter(base) <= Duration::from_millis(250));
        }
        assert_eq!(random_jitter(Duration::ZERO), Duration::ZERO);
    }
}
