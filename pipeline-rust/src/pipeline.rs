use crate::{
    cache,
    coordinator::{fallback_artifact, next_generated_at, FailureReason, RequestCoordinator},
    history::HistoryRecorder,
    opentelemetry::PipelineSpan,
    progress::{
        Liveness, ProgressListener, ProgressStages, TickInterval, DEFAULT_COMPLETION_MESSAGE,
    },
    topics, GeneratedArtifact, Identity, PipelineError, Topic, UserRecord, UserStore,
};
use cheatsheet_client::CheatSheetBackend;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Topic shown on the fallback page of a replay that carries no topic.
const UNKNOWN_TOPIC: &str = "Unknown topic";

/// What navigation asked the pipeline to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Generate a new sheet. Never consults stored sheets.
    Topic(String),
    /// Show a stored sheet. Never calls the backend. `generated_at` is
    /// `None` when the identifier could not be read, which is a miss.
    Replay {
        generated_at: Option<DateTime<Utc>>,
        topic: Option<String>,
    },
}

impl Invocation {
    pub fn topic(&self) -> Option<&str> {
        match self {
            Self::Topic(topic) => Some(topic.as_str()),
            Self::Replay { topic, .. } => topic.as_deref(),
        }
    }

    pub fn replay(generated_at: DateTime<Utc>) -> Self {
        Self::Replay {
            generated_at: Some(generated_at),
            topic: None,
        }
    }
}

/// Parameters passed by navigation, as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

impl TryFrom<NavigationParams> for Invocation {
    type Error = PipelineError;

    fn try_from(params: NavigationParams) -> Result<Self, Self::Error> {
        let topic = params
            .topic
            .map(|topic| topic.trim().to_string())
            .filter(|topic| !topic.is_empty());

        if let Some(identifier) = params.generated_at {
            let generated_at = DateTime::parse_from_rfc3339(identifier.trim())
                .map(|at| at.with_timezone(&Utc))
                .map_err(|error| {
                    debug!(identifier = %identifier, error = %error, "unreadable sheet identifier");
                })
                .ok();
            return Ok(Self::Replay {
                generated_at,
                topic,
            });
        }

        topic.map(Self::Topic).ok_or_else(|| {
            PipelineError::InvalidInput("either a topic or a sheet identifier is required".into())
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeSource {
    CacheHit,
    Generated,
    Fallback,
}

/// What the render target shows after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub artifact: GeneratedArtifact,
    pub related_topics: Vec<Topic>,
    pub source: OutcomeSource,
    pub failure: Option<FailureReason>,
}

impl PipelineOutcome {
    /// The invocation that retries a failed run from the start.
    #[must_use]
    pub fn retry_invocation(&self) -> Option<Invocation> {
        match self.failure {
            Some(FailureReason::Network | FailureReason::Server | FailureReason::Generation) => {
                Some(Invocation::Topic(self.artifact.topic.clone()))
            }
            Some(FailureReason::NotFound) | None => None,
        }
    }
}

/// Entry point: decides between replay and generation, persists new sheets
/// and prepares the related topics.
pub struct CheatSheetPipeline {
    store: Arc<dyn UserStore>,
    coordinator: RequestCoordinator,
    recorder: HistoryRecorder,
    curated_topics: Vec<Topic>,
    record_failures: bool,
}

impl CheatSheetPipeline {
    #[must_use]
    pub fn new(params: PipelineParams) -> Self {
        Self {
            coordinator: RequestCoordinator::new(
                params.backend,
                params.stages,
                params.tick_interval,
                params.completion_message,
            ),
            recorder: HistoryRecorder::new(params.store.clone()),
            store: params.store,
            curated_topics: params.curated_topics,
            record_failures: params.record_failures,
        }
    }

    pub fn builder(
        backend: Arc<dyn CheatSheetBackend>,
        store: Arc<dyn UserStore>,
    ) -> PipelineParams {
        PipelineParams::new(backend, store)
    }

    #[must_use]
    pub fn recorder(&self) -> &HistoryRecorder {
        &self.recorder
    }

    /// Run the pipeline once. Only invalid input is an error; every other
    /// failure ends in a renderable fallback sheet.
    pub async fn run(
        &self,
        identity: &Identity,
        invocation: Invocation,
        listener: Arc<dyn ProgressListener>,
        liveness: &Liveness,
    ) -> Result<PipelineOutcome, PipelineError> {
        let mut span = PipelineSpan::new(&invocation);
        let result = span
            .instrument_future(self.run_inner(identity, invocation, listener, liveness))
            .await;

        match &result {
            Ok(outcome) => span.on_outcome(outcome),
            Err(error) => span.on_error(error),
        }

        result
    }

    async fn run_inner(
        &self,
        identity: &Identity,
        invocation: Invocation,
        listener: Arc<dyn ProgressListener>,
        liveness: &Liveness,
    ) -> Result<PipelineOutcome, PipelineError> {
        match invocation {
            Invocation::Replay {
                generated_at,
                topic,
            } => Ok(self.replay(identity, generated_at, topic).await),
            Invocation::Topic(topic) => {
                let topic = topic.trim();
                if topic.is_empty() {
                    return Err(PipelineError::InvalidInput("topic must not be empty".into()));
                }
                Ok(self.generate(identity, topic, listener, liveness).await)
            }
        }
    }

    async fn replay(
        &self,
        identity: &Identity,
        generated_at: Option<DateTime<Utc>>,
        topic: Option<String>,
    ) -> PipelineOutcome {
        let record = self.load_record(identity).await;

        if let Some(artifact) = record
            .as_ref()
            .and_then(|record| cache::lookup(record, generated_at))
        {
            debug!(topic = %artifact.topic, "replaying stored cheat sheet");
            return PipelineOutcome {
                related_topics: topics::merge(&self.curated_topics, &artifact.related_topics),
                artifact: artifact.clone(),
                source: OutcomeSource::CacheHit,
                failure: None,
            };
        }

        debug!(?generated_at, "no stored cheat sheet for identifier");
        let topic = topic.as_deref().unwrap_or(UNKNOWN_TOPIC);
        PipelineOutcome {
            artifact: fallback_artifact(topic, next_generated_at(None)),
            related_topics: self.curated_topics.clone(),
            source: OutcomeSource::Fallback,
            failure: Some(FailureReason::NotFound),
        }
    }

    async fn generate(
        &self,
        identity: &Identity,
        topic: &str,
        listener: Arc<dyn ProgressListener>,
        liveness: &Liveness,
    ) -> PipelineOutcome {
        let latest = self
            .load_record(identity)
            .await
            .and_then(|record| record.latest_generated_at());

        let generation = self
            .coordinator
            .generate_after(topic, latest, listener, liveness)
            .await;

        let mut artifact = generation.artifact;
        if generation.failure.is_none() || self.record_failures {
            let record = self.recorder.record(identity, artifact.clone(), topic).await;
            if let Some(stored) = record.generated_sheets.last() {
                artifact = stored.clone();
            }
        }

        PipelineOutcome {
            related_topics: topics::merge(&self.curated_topics, &artifact.related_topics),
            source: if generation.failure.is_some() {
                OutcomeSource::Fallback
            } else {
                OutcomeSource::Generated
            },
            failure: generation.failure,
            artifact,
        }
    }

    async fn load_record(&self, identity: &Identity) -> Option<UserRecord> {
        match self.store.get(identity.key()).await {
            Ok(record) => record,
            Err(error) => {
                warn!(user = identity.key(), error = %error, "failed to load user record");
                None
            }
        }
    }
}

/// Parameters required to create a new pipeline.
/// # Default Values
/// - `stages`: the five built-in stage messages
/// - `tick_interval`: 2 seconds
/// - `completion_message`: `"Complete!"`
/// - `curated_topics`: [`topics::curated_topics`]
/// - `record_failures`: `true`
pub struct PipelineParams {
    pub backend: Arc<dyn CheatSheetBackend>,
    /// Where user records live.
    pub store: Arc<dyn UserStore>,
    /// Messages shown while the backend works, in order.
    pub stages: ProgressStages,
    /// How often the progress advances to the next stage.
    pub tick_interval: TickInterval,
    /// Message shown together with 100%.
    pub completion_message: String,
    /// Related topics listed before the backend's suggestions.
    pub curated_topics: Vec<Topic>,
    /// Whether a fallback sheet is persisted like a generated one.
    pub record_failures: bool,
}

impl PipelineParams {
    pub fn new(backend: Arc<dyn CheatSheetBackend>, store: Arc<dyn UserStore>) -> Self {
        Self {
            backend,
            store,
            stages: ProgressStages::default(),
            tick_interval: TickInterval::default(),
            completion_message: DEFAULT_COMPLETION_MESSAGE.to_string(),
            curated_topics: topics::curated_topics(),
            record_failures: true,
        }
    }

    #[must_use]
    pub fn stages(mut self, stages: ProgressStages) -> Self {
        self.stages = stages;
        self
    }

    /// Set how often progress advances. Rejects a zero interval.
    pub fn tick_interval(mut self, tick_interval: Duration) -> Result<Self, PipelineError> {
        self.tick_interval = TickInterval::new(tick_interval)?;
        Ok(self)
    }

    #[must_use]
    pub fn completion_message(mut self, message: impl Into<String>) -> Self {
        self.completion_message = message.into();
        self
    }

    #[must_use]
    pub fn curated_topics(mut self, topics: Vec<Topic>) -> Self {
        self.curated_topics = topics;
        self
    }

    #[must_use]
    pub fn record_failures(mut self, record_failures: bool) -> Self {
        self.record_failures = record_failures;
        self
    }

    #[must_use]
    pub fn build(self) -> CheatSheetPipeline {
        CheatSheetPipeline::new(self)
    }
}
