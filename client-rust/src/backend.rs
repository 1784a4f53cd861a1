use crate::{GenerateRequest, GenerateResponse, GenerationResult};

/// A service able to produce a cheat sheet for a topic.
///
/// Implementations return the raw backend response. A response that arrives
/// but is unusable (`success: false`, no HTML) is still returned as `Ok`;
/// callers decide with [`GenerateResponse::validate`].
#[async_trait::async_trait]
pub trait CheatSheetBackend: Send + Sync {
    fn provider(&self) -> &'static str;
    async fn generate(&self, request: GenerateRequest) -> GenerationResult<GenerateResponse>;
}
