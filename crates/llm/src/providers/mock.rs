//! Deterministic mock LLM provider for tests and offline use.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use manualqa_core::{AppError, AppResult};
use std::time::Duration;

/// Mock completion client.
///
/// Returns a fixed, configured response regardless of the prompt. An
/// optional artificial delay and a failure mode make timeout and error
/// paths testable without a live model.
pub struct MockClient {
    response: String,
    delay: Option<Duration>,
    fail: bool,
}

impl MockClient {
    /// Create a mock that answers every request with `response`.
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            delay: None,
            fail: false,
        }
    }

    /// Create a mock that fails every request with a generation error.
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            delay: None,
            fail: true,
        }
    }

    /// Sleep for `delay` before responding.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(AppError::Generation("mock completion failure".to_string()));
        }

        Ok(LlmResponse {
            content: self.response.clone(),
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}
