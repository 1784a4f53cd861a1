pub mod cache;
mod coordinator;
mod errors;
mod history;
mod opentelemetry;
mod pipeline;
pub mod progress;
mod store;
pub mod topics;
mod types;

pub use coordinator::{
    fallback_artifact, fallback_html, FailureReason, Generation, RequestCoordinator,
    DEFAULT_DIFFICULTY, DEFAULT_PROGRAMMING_LANGUAGE, FALLBACK_NOTICE,
};
pub use errors::{BoxedError, PipelineError};
pub use history::HistoryRecorder;
pub use pipeline::{
    CheatSheetPipeline, Invocation, NavigationParams, OutcomeSource, PipelineOutcome,
    PipelineParams,
};
pub use progress::{
    Liveness, NoopListener, ProgressListener, ProgressStages, ProgressUpdate, TickInterval,
};
pub use store::{InMemoryUserStore, UserStore};
pub use types::*;
