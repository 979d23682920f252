//! Triggers the [Pipeline] once or on an [Interval].

mod interval;
pub mod shutdown;

use chrono::Local;
use tokio_util::sync::CancellationToken;

pub use interval::{Interval, IntervalError};

use crate::backup::{Pipeline, RunError, RunSummary};

/// Runs the [Pipeline] on its [Interval].
///
/// Runs never overlap: the next trigger is computed after a run finished, so
/// triggers that pass during a long run are skipped.
#[derive(Clone)]
pub struct Scheduler {
    interval: Interval,
    pipeline: Pipeline,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(interval: Interval, pipeline: Pipeline) -> Self {
        Self { interval, pipeline }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Executes a single run right away.
    pub async fn run_once(&self) -> Result<RunSummary, RunError> {
        log::info!(target: "scheduler", "Running backup job to test configuration");
        self.pipeline.run().await
    }

    /// Executes runs on every trigger until `cancel` is cancelled.
    ///
    /// Cancellation only stops waiting for the next trigger, a run in progress
    /// is not interrupted. A run failing with a [RunError] ends the loop.
    pub async fn run_forever(&self, cancel: CancellationToken) -> Result<(), RunError> {
        loop {
            let now = Local::now();
            let Some(next) = self.interval.next_after(&now) else {
                log::warn!(target: "scheduler", "Interval has no upcoming trigger, stopping");
                return Ok(());
            };
            let delay = (next - now).to_std().unwrap_or_default();
            log::debug!(target: "scheduler", "Next backup at {next}");

            tokio::select! {
                _ = cancel.cancelled() => {
                    log::info!(target: "scheduler", "Scheduler stopped");
                    return Ok(());
                }
                _ = tokio::time::sleep(delay) => {}
            }

            self.pipeline.run().await?;
        }
    }
}
