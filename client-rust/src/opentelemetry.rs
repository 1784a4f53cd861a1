use crate::{GenerateResponse, GenerationError};
use opentelemetry::trace::Status;
use std::time::Instant;
use tracing::{debug, info_span, Span};
use tracing_futures::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub struct GenerationSpan {
    span: Span,
    start_time: Instant,
}

impl GenerationSpan {
    pub fn new(provider: &str, topic: &str) -> Self {
        let span = info_span!("cheatsheet_client.generate");
        span.set_attribute("cheatsheet.provider", provider.to_string());
        span.set_attribute("cheatsheet.topic", topic.to_string());

        Self {
            span,
            start_time: Instant::now(),
        }
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

    pub fn on_response(&mut self, response: &GenerateResponse) {
        self.span.set_attribute("cheatsheet.success", response.success);
        if let Some(html) = &response.html {
            self.span.set_attribute(
                "cheatsheet.html_bytes",
                i64::try_from(html.len()).unwrap_or(i64::MAX),
            );
        }
        if let Some(related) = &response.related_topics {
            self.span.set_attribute(
                "cheatsheet.related_topics",
                i64::try_from(related.len()).unwrap_or(i64::MAX),
            );
        }
    }

    pub fn on_error(&mut self, error: &GenerationError) {
        self.span
            .set_attribute("exception.message", error.to_string());
        self.span.set_status(Status::error(error.to_string()));
    }

    pub fn on_end(&mut self) {
        let elapsed = self.start_time.elapsed();
        self.span
            .set_attribute("cheatsheet.duration_ms", elapsed.as_secs_f64() * 1000.0);
        self.span.in_scope(|| {
            debug!(elapsed_ms = elapsed.as_secs_f64() * 1000.0, "generation request finished");
        });
    }
}
