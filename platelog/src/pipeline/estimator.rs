use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::llm::{extract_json, CompletionOptions, JsonShape, TextGenerator};
use crate::rate_limit::RateLimiter;

/// Stage-local failure of a language-model query. Never leaves the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimatorError {
    #[error("service unavailable: {reason}")]
    ServiceUnavailable { reason: String },

    #[error("malformed model output")]
    MalformedOutput { raw: String },
}

impl EstimatorError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, EstimatorError::ServiceUnavailable { .. })
    }

    fn malformed(raw: &str) -> Self {
        EstimatorError::MalformedOutput {
            raw: raw.to_string(),
        }
    }
}

/// Sends one prompt, waits for one answer, and parses the first JSON value
/// of the expected shape out of it. No retries and no caching.
pub struct Estimator {
    generator: Arc<dyn TextGenerator>,
    limiter: Arc<RateLimiter>,
    timeout: Duration,
}

impl Estimator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        limiter: Arc<RateLimiter>,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            limiter,
            timeout,
        }
    }

    pub async fn query<T: DeserializeOwned>(
        &self,
        stage: &'static str,
        prompt: &str,
        shape: JsonShape,
        options: &CompletionOptions,
    ) -> Result<T, EstimatorError> {
        let (raw, value) = self.query_value(stage, prompt, shape, options).await?;

        serde_json::from_value(value).map_err(|error| {
            tracing::debug!(stage, error = %error, "Model JSON did not match stage schema");
            EstimatorError::malformed(&raw)
        })
    }

    /// Returns the response text along with the JSON value found in it.
    async fn query_value(
        &self,
        stage: &'static str,
        prompt: &str,
        shape: JsonShape,
        options: &CompletionOptions,
    ) -> Result<(String, Value), EstimatorError> {
        self.limiter.acquire().await;

        let raw = match tokio::time::timeout(self.timeout, self.generator.generate(prompt, options))
            .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(error)) => {
                tracing::warn!(stage, error = %error, "Language model call failed");
                return Err(EstimatorError::ServiceUnavailable {
                    reason: error.to_string(),
                });
            }
            Err(_) => {
                tracing::warn!(
                    stage,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Language model call timed out"
                );
                return Err(EstimatorError::ServiceUnavailable {
                    reason: format!("timed out after {:?}", self.timeout),
                });
            }
        };

        match extract_json(&raw, shape) {
            Some(value) => Ok((raw, value)),
            None => {
                tracing::warn!(
                    stage,
                    response_len = raw.len(),
                    response_preview = %raw.chars().take(100).collect::<String>(),
                    "No JSON of the expected shape in model output"
                );
                Err(EstimatorError::malformed(&raw))
            }
        }
    }
}
