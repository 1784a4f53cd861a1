use crate::{Invocation, OutcomeSource, PipelineError, PipelineOutcome};
use opentelemetry::trace::Status;
use tracing::{info_span, Span};
use tracing_futures::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub struct PipelineSpan {
    span: Span,
}

impl PipelineSpan {
    pub fn new(invocation: &Invocation) -> Self {
        let span = info_span!("cheatsheet_pipeline.run");
        let kind = match invocation {
            Invocation::Topic(_) => "topic",
            Invocation::Replay { .. } => "replay",
        };
        span.set_attribute("cheatsheet.invocation", kind);
        if let Some(topic) = invocation.topic() {
            span.set_attribute("cheatsheet.topic", topic.to_string());
        }

        Self { span }
    }

    fn span(&self) -> Span {
        self.span.clone()
    }

    pub async fn instrument_future<F>(&self, future: F) -> F::Output
    where
        F: std::future::Future,
    {
        future.instrument(self.span()).await
    }

    pub fn on_outcome(&mut self, outcome: &PipelineOutcome) {
        let source = match outcome.source {
            OutcomeSource::CacheHit => "cache_hit",
            OutcomeSource::Generated => "generated",
            OutcomeSource::Fallback => "fallback",
        };
        self.span.set_attribute("cheatsheet.source", source);
        self.span.set_attribute(
            "cheatsheet.related_topics",
            i64::try_from(outcome.related_topics.len()).unwrap_or(i64::MAX),
        );
        if let Some(failure) = outcome.failure {
            self.span.set_status(Status::error(failure.message()));
        }
    }

    pub fn on_error(&mut self, error: &PipelineError) {
        self.span
            .set_attribute("exception.message", error.to_string());
        self.span.set_status(Status::error(error.to_string()));
    }
}
