use std::{collections::VecDeque, sync::Mutex, time::Duration};

use crate::{
    backend::CheatSheetBackend,
    errors::{GenerationError, GenerationResult},
    GenerateRequest, GenerateResponse,
};

/// Result for a mocked `generate` call.
/// It can either be a response to return or an error.
pub enum MockGenerateResult {
    Response(GenerateResponse),
    Error(GenerationError),
}

impl MockGenerateResult {
    /// Construct a result that yields the provided response.
    pub fn response(response: GenerateResponse) -> Self {
        Self::Response(response)
    }

    /// Construct a result that yields the provided error.
    pub fn error(error: GenerationError) -> Self {
        Self::Error(error)
    }
}

impl From<GenerateResponse> for MockGenerateResult {
    fn from(response: GenerateResponse) -> Self {
        Self::response(response)
    }
}

impl From<GenerationError> for MockGenerateResult {
    fn from(error: GenerationError) -> Self {
        Self::error(error)
    }
}

impl From<GenerationResult<GenerateResponse>> for MockGenerateResult {
    fn from(result: GenerationResult<GenerateResponse>) -> Self {
        match result {
            Ok(response) => Self::Response(response),
            Err(error) => Self::Error(error),
        }
    }
}

#[derive(Default)]
struct MockBackendState {
    mocked_results: VecDeque<MockGenerateResult>,
    tracked_requests: Vec<GenerateRequest>,
}

/// A mock backend for testing that tracks requests and yields predefined
/// results, optionally after a simulated latency.
pub struct MockBackend {
    provider: &'static str,
    latency: Option<Duration>,
    state: Mutex<MockBackendState>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            provider: "mock",
            latency: None,
            state: Mutex::new(MockBackendState::default()),
        }
    }
}

impl MockBackend {
    /// Construct a new mock backend instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every `generate` call by `latency` before answering.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Convenience to enqueue a single mocked result.
    pub fn enqueue<R>(&self, result: R) -> &Self
    where
        R: Into<MockGenerateResult>,
    {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.mocked_results.push_back(result.into());
        drop(state);
        self
    }

    /// Retrieve the tracked requests accumulated so far.
    pub fn tracked_requests(&self) -> Vec<GenerateRequest> {
        let state = self.state.lock().expect("mock state poisoned");
        state.tracked_requests.clone()
    }

    /// Number of `generate` calls received so far.
    pub fn call_count(&self) -> usize {
        let state = self.state.lock().expect("mock state poisoned");
        state.tracked_requests.len()
    }

    /// Clear both tracked requests and enqueued results.
    pub fn restore(&self) {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.mocked_results.clear();
        state.tracked_requests.clear();
    }
}

#[async_trait::async_trait]
impl CheatSheetBackend for MockBackend {
    fn provider(&self) -> &'static str {
        self.provider
    }

    async fn generate(&self, request: GenerateRequest) -> GenerationResult<GenerateResponse> {
        let result = {
            let mut state = self.state.lock().expect("mock state poisoned");
            state.tracked_requests.push(request);
            state.mocked_results.pop_front()
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match result {
            Some(MockGenerateResult::Response(response)) => Ok(response),
            Some(MockGenerateResult::Error(error)) => Err(error),
            None => Err(GenerationError::Invariant(
                self.provider,
                "no mocked generate results available".into(),
            )),
        }
    }
}
