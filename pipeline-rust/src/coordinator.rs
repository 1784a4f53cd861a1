use crate::{
    progress::{
        Liveness, ProgressListener, ProgressStages, ProgressTracker, StageTicker, TickInterval,
    },
    topics, GeneratedArtifact,
};
use cheatsheet_client::{
    CheatSheetBackend, FailureKind, GenerateRequest, GenerateResponse, GenerationError,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_DIFFICULTY: &str = "intermediate";
pub const DEFAULT_PROGRAMMING_LANGUAGE: &str = "Python";
pub const FALLBACK_NOTICE: &str = "Failed to fetch cheat sheet";

/// Why a sheet could not be produced. Carries the message shown alongside
/// the retry prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The backend could not be reached.
    Network,
    /// The backend answered with an error status.
    Server,
    /// The backend answered but the body was unreadable, reported
    /// `success: false`, or carried no html.
    Generation,
    /// A replay identifier did not match any stored sheet.
    NotFound,
}

impl FailureReason {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Network => "Cannot connect to server. Please ensure the backend is running.",
            Self::Server => "Server error. Please try again.",
            Self::Generation => "Failed to generate cheat sheet",
            Self::NotFound => FALLBACK_NOTICE,
        }
    }
}

impl From<&GenerationError> for FailureReason {
    fn from(error: &GenerationError) -> Self {
        match error.kind() {
            FailureKind::Network => Self::Network,
            FailureKind::Server => Self::Server,
            FailureKind::Generation => Self::Generation,
        }
    }
}

/// Result of one coordinated request. `artifact` is always renderable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub artifact: GeneratedArtifact,
    pub failure: Option<FailureReason>,
}

impl Generation {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.failure.is_some()
    }
}

/// Drives one backend call while simulating staged progress.
pub struct RequestCoordinator {
    backend: Arc<dyn CheatSheetBackend>,
    stages: ProgressStages,
    tick_interval: TickInterval,
    completion_message: String,
}

impl RequestCoordinator {
    pub fn new(
        backend: Arc<dyn CheatSheetBackend>,
        stages: ProgressStages,
        tick_interval: TickInterval,
        completion_message: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            stages,
            tick_interval,
            completion_message: completion_message.into(),
        }
    }

    /// Generate a sheet for `topic`. Never fails: transport errors, bad JSON
    /// and unusable responses all produce the fallback sheet.
    pub async fn generate(
        &self,
        topic: &str,
        listener: Arc<dyn ProgressListener>,
        liveness: &Liveness,
    ) -> Generation {
        self.generate_after(topic, None, listener, liveness).await
    }

    /// Like [`generate`](Self::generate), but stamps `generated_at` strictly
    /// after `not_before` so the key stays unique within a user's sheets.
    pub async fn generate_after(
        &self,
        topic: &str,
        not_before: Option<DateTime<Utc>>,
        listener: Arc<dyn ProgressListener>,
        liveness: &Liveness,
    ) -> Generation {
        let tracker = Arc::new(ProgressTracker::new(
            self.stages.clone(),
            self.completion_message.clone(),
            listener,
            liveness.clone(),
        ));
        tracker.begin();

        // dropped with this future if the caller goes away
        let ticker = {
            let tracker = tracker.clone();
            StageTicker::start(self.tick_interval, move || tracker.advance())
        };

        debug!(provider = self.backend.provider(), topic, "requesting cheat sheet");
        let result = self
            .backend
            .generate(GenerateRequest::new(topic))
            .await
            .and_then(GenerateResponse::validate);

        ticker.cancel();
        tracker.complete();

        let generated_at = next_generated_at(not_before);
        match result {
            Ok(response) => Generation {
                artifact: artifact_from_response(topic, response, generated_at),
                failure: None,
            },
            Err(error) => {
                warn!(topic, error = %error, "cheat sheet generation failed, using fallback");
                Generation {
                    artifact: fallback_artifact(topic, generated_at),
                    failure: Some(FailureReason::from(&error)),
                }
            }
        }
    }
}

/// `now`, or the smallest instant after `not_before` when the clock has not
/// moved past it.
pub(crate) fn next_generated_at(not_before: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match not_before {
        Some(latest) if now <= latest => latest + chrono::Duration::microseconds(1),
        _ => now,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn artifact_from_response(
    requested_topic: &str,
    response: GenerateResponse,
    generated_at: DateTime<Utc>,
) -> GeneratedArtifact {
    GeneratedArtifact {
        topic: non_blank(response.topic).unwrap_or_else(|| requested_topic.to_string()),
        difficulty: non_blank(response.difficulty)
            .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
        programming_language: non_blank(response.programming_language)
            .unwrap_or_else(|| DEFAULT_PROGRAMMING_LANGUAGE.to_string()),
        html: response.html.unwrap_or_default(),
        related_topics: topics::dedup_titles(response.related_topics.unwrap_or_default()),
        generated_at,
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Placeholder page for a topic whose sheet could not be produced. Depends
/// only on `topic`.
#[must_use]
pub fn fallback_html(topic: &str) -> String {
    let topic = escape_html(topic);
    format!(
        "<html><body><h1>{topic}</h1><p>{FALLBACK_NOTICE} for \"{topic}\". Please try again.</p></body></html>"
    )
}

#[must_use]
pub fn fallback_artifact(topic: &str, generated_at: DateTime<Utc>) -> GeneratedArtifact {
    GeneratedArtifact {
        topic: topic.to_string(),
        difficulty: DEFAULT_DIFFICULTY.to_string(),
        programming_language: DEFAULT_PROGRAMMING_LANGUAGE.to_string(),
        html: fallback_html(topic),
        related_topics: Vec::new(),
        generated_at,
    }
}
