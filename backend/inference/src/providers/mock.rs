use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use snaplens_core::{InferenceProvider, InferenceRequest, InferenceResponse, SnapError};

/// Canned-response provider for tests, demos, and offline runs. Counts its
/// calls so tests can assert that failed pipelines never reached inference.
pub struct MockProvider {
    response: Option<String>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            response: Some("Mock response".to_string()),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Reply with no content field, exercising the client's soft fallback.
    pub fn with_empty_reply(mut self) -> Self {
        self.response = None;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, _request: &InferenceRequest) -> Result<InferenceResponse, SnapError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SnapError::InferenceFailed {
                provider: "mock".into(),
                message: "configured to fail".into(),
            });
        }
        Ok(InferenceResponse {
            content: self.response.clone(),
            provider: "mock".to_string(),
            latency_ms: 0,
        })
    }
}
