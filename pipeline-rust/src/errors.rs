use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("User store error: {0}")]
    Store(#[source] BoxedError),
}

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;
