use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    /// The request to the backend could not be sent or its body could not be
    /// read.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The request returns a non-OK status code
    #[error("Status error: {1} (Status {0})")]
    StatusCode(reqwest::StatusCode, String),
    /// The response body is not the JSON document the backend promises.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// The backend answered but reported a failure (`success: false`) or did
    /// not return any HTML.
    #[error("Backend error: {0}")]
    Backend(String),
    /// Something the client relies on did not hold (e.g. a mock with no
    /// queued results).
    #[error("Invariant from {0}: {1}")]
    Invariant(&'static str, String),
}

/// Coarse classification of a generation failure, used to pick the message
/// shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never got an HTTP answer.
    Network,
    /// The backend answered with a non-success status.
    Server,
    /// The backend answered 2xx but the body did not carry a usable sheet.
    Generation,
}

impl GenerationError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Network,
            Self::StatusCode(..) => FailureKind::Server,
            Self::InvalidResponse(_) | Self::Backend(_) | Self::Invariant(..) => {
                FailureKind::Generation
            }
        }
    }
}

pub type GenerationResult<T> = Result<T, GenerationError>;
