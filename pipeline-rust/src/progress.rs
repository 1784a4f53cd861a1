use crate::PipelineError;
use std::{
    ops::ControlFlow,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};
use tokio::{task::JoinHandle, time::Instant};
use tracing::trace;

pub const DEFAULT_STAGE_MESSAGES: [&str; 5] = [
    "Analyzing the algorithm...",
    "Generating code examples...",
    "Creating practice problems...",
    "Adding mathematical notation...",
    "Finalizing your cheat sheet...",
];
pub const DEFAULT_COMPLETION_MESSAGE: &str = "Complete!";
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(2);
pub const MAX_STAGES: usize = 5;

/// One observable step of the simulated progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// 0..=100. Only the completion update reaches 100.
    pub percent: u8,
    pub message: String,
}

impl ProgressUpdate {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.percent == 100
    }
}

/// Receives progress updates for one generation.
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, update: &ProgressUpdate);
}

impl<F> ProgressListener for F
where
    F: Fn(&ProgressUpdate) + Send + Sync,
{
    fn on_progress(&self, update: &ProgressUpdate) {
        self(update);
    }
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl ProgressListener for NoopListener {
    fn on_progress(&self, _update: &ProgressUpdate) {}
}

/// Liveness flag of the view that started a request.
/// Once torn down, nothing belonging to that view is touched again.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Default for Liveness {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl Liveness {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn tear_down(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Ordered, non-empty list of at most [`MAX_STAGES`] stage messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressStages(Vec<String>);

impl Default for ProgressStages {
    fn default() -> Self {
        Self(DEFAULT_STAGE_MESSAGES.iter().map(ToString::to_string).collect())
    }
}

impl ProgressStages {
    pub fn new<I, S>(messages: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let messages: Vec<String> = messages.into_iter().map(Into::into).collect();
        if messages.is_empty() || messages.len() > MAX_STAGES {
            return Err(PipelineError::InvalidInput(format!(
                "expected 1 to {MAX_STAGES} progress stages, got {}",
                messages.len()
            )));
        }
        Ok(Self(messages))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Percentage shown while `index` is the current stage. Stays below 100.
    fn percent_at(&self, index: usize) -> u8 {
        u8::try_from(index * 100 / self.0.len()).unwrap_or(99)
    }

    fn update_at(&self, index: usize) -> ProgressUpdate {
        ProgressUpdate {
            percent: self.percent_at(index),
            message: self.0[index].clone(),
        }
    }
}

/// Non-zero period between two stage advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInterval(Duration);

impl Default for TickInterval {
    fn default() -> Self {
        Self(DEFAULT_TICK_INTERVAL)
    }
}

impl TickInterval {
    pub fn new(interval: Duration) -> Result<Self, PipelineError> {
        if interval.is_zero() {
            return Err(PipelineError::InvalidInput(
                "progress tick interval must be non-zero".to_string(),
            ));
        }
        Ok(Self(interval))
    }

    #[must_use]
    pub fn as_duration(self) -> Duration {
        self.0
    }
}

struct TrackerState {
    stage: usize,
    finished: bool,
}

/// Shared progress state for one generation. The stage timer and the request
/// both go through it, so the completion update is emitted exactly once and
/// nothing is emitted after it.
pub(crate) struct ProgressTracker {
    stages: ProgressStages,
    completion_message: String,
    listener: Arc<dyn ProgressListener>,
    liveness: Liveness,
    state: Mutex<TrackerState>,
}

impl ProgressTracker {
    pub(crate) fn new(
        stages: ProgressStages,
        completion_message: String,
        listener: Arc<dyn ProgressListener>,
        liveness: Liveness,
    ) -> Self {
        Self {
            stages,
            completion_message,
            listener,
            liveness,
            state: Mutex::new(TrackerState {
                stage: 0,
                finished: false,
            }),
        }
    }

    /// Emit the first stage.
    pub(crate) fn begin(&self) {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.finished {
            self.emit(&self.stages.update_at(state.stage));
        }
    }

    /// Move to the next stage. Breaks once the stages are exhausted, the
    /// request resolved, or the view is gone.
    pub(crate) fn advance(&self) -> ControlFlow<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.finished || !self.liveness.is_alive() {
            return ControlFlow::Break(());
        }
        if state.stage + 1 >= self.stages.len() {
            // hold at the last stage until the request resolves
            return ControlFlow::Break(());
        }
        state.stage += 1;
        self.emit(&self.stages.update_at(state.stage));
        if state.stage + 1 >= self.stages.len() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    /// Force 100%. Only the first call has an effect.
    pub(crate) fn complete(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.finished {
            return;
        }
        state.finished = true;
        self.emit(&ProgressUpdate {
            percent: 100,
            message: self.completion_message.clone(),
        });
    }

    fn emit(&self, update: &ProgressUpdate) {
        if self.liveness.is_alive() {
            trace!(percent = update.percent, stage = %update.message, "progress");
            self.listener.on_progress(update);
        }
    }
}

/// Recurring task on a fixed interval. The first tick fires one interval
/// after `start`.
pub struct StageTicker;

impl StageTicker {
    /// Run `tick` every `interval` until it breaks or the handle is
    /// cancelled or dropped. Must be called within a tokio runtime.
    pub fn start<F>(interval: TickInterval, mut tick: F) -> TickerHandle
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let interval = interval.as_duration();
        let task = tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                ticks.tick().await;
                if tick().is_break() {
                    break;
                }
            }
        });
        TickerHandle { task: Some(task) }
    }
}

/// Owns a running [`StageTicker`]. Dropping the handle cancels the ticker.
pub struct TickerHandle {
    task: Option<JoinHandle<()>>,
}

impl TickerHandle {
    pub fn cancel(mut self) {
        self.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.abort();
    }
}
