//! Exponential-backoff retry wrapper around any [`LlmPort`] (SPEC_FULL.md
//! "Resilient LLM wrapper"). Grounded directly on the teacher's
//! `infrastructure::resilient_llm::ResilientLlmClient`, adapted from its
//! `Result<LlmResponse, LlmError>` contract to this port's `Option<T>`
//! contract: a `None` is the only failure signal available, so every
//! `None` is treated as retryable until the attempt budget is spent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::application::ports::{ChatTurn, LlmPort, LlmProfile};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 2, base_delay_ms: 200, max_delay_ms: 2_000, jitter_factor: 0.2 }
    }
}

pub struct ResilientLlmClient {
    inner: Arc<dyn LlmPort>,
    config: RetryConfig,
}

impl ResilientLlmClient {
    pub fn new(inner: Arc<dyn LlmPort>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.config.base_delay_ms;
        let exponential = base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exponential.min(self.config.max_delay_ms);
        let jitter_range = (capped as f64 * self.config.jitter_factor) as i64;
        let delay_ms = if jitter_range > 0 {
            let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
            (capped as i64 + jitter).max(0) as u64
        } else {
            capped
        };
        Duration::from_millis(delay_ms)
    }

    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Option<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Option<T>>,
    {
        for attempt in 0..=self.config.max_retries {
            if let Some(value) = operation().await {
                if attempt > 0 {
                    tracing::info!(attempt = attempt + 1, operation = operation_name, "llm call succeeded after retry");
                }
                return Some(value);
            }
            if attempt < self.config.max_retries {
                let delay = self.delay_for(attempt + 1);
                tracing::warn!(attempt = attempt + 1, operation = operation_name, delay_ms = delay.as_millis() as u64, "llm call returned null, retrying");
                tokio::time::sleep(delay).await;
            }
        }
        tracing::warn!(attempts = self.config.max_retries + 1, operation = operation_name, "llm call failed after all retries");
        None
    }
}

#[async_trait]
impl LlmPort for ResilientLlmClient {
    async fn complete(&self, system_prompt: &str, user_message: &str, profile: LlmProfile) -> Option<String> {
        self.with_retry("complete", || self.inner.complete(system_prompt, user_message, profile)).await
    }

    async fn complete_with_history(
        &self,
        system_prompt: &str,
        history: &[ChatTurn],
        profile: LlmProfile,
    ) -> Option<String> {
        self.with_retry("complete_with_history", || {
            self.inner.complete_with_history(system_prompt, history, profile)
        })
        .await
    }

    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        self.with_retry("embed", || self.inner.embed(text)).await
    }
}
