//! Job state machine
//!
//! ```text
//! STARTED ──step ok──────────────► COMPLETED
//!    │
//!    └──step error / timeout /────► FAILED
//!       query registration fault
//! ```
//!
//! The state lives in a [`JobStateCell`] owned by the running execution. The
//! state query reads the cell; only the execution's own task writes it, and
//! only once.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use super::activities::WorkloadError;
use super::models::JobState;

/// Name under which the state query is registered with the engine.
pub const STATE_QUERY: &str = "state";

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("step exceeded its start-to-close budget of {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Workload(#[from] WorkloadError),
}

/// Shared, lock-free holder of a job's current state.
#[derive(Debug, Clone)]
pub struct JobStateCell(Arc<AtomicU8>);

impl Default for JobStateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStateCell {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(JobState::Started as u8)))
    }

    pub fn get(&self) -> JobState {
        JobState::from_repr(self.0.load(Ordering::Acquire)).unwrap_or(JobState::Failed)
    }

    /// Apply the step outcome. Returns the state after the call; a cell that
    /// is already terminal is left untouched.
    pub fn settle(&self, step_succeeded: bool) -> JobState {
        let target = JobState::Started.settle(step_succeeded);
        match self.0.compare_exchange(
            JobState::Started as u8,
            target as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => target,
            Err(current) => JobState::from_repr(current).unwrap_or(JobState::Failed),
        }
    }
}

/// Drives one job execution from STARTED to a terminal state.
#[derive(Debug)]
pub struct JobStateMachine {
    job_id: String,
    cell: JobStateCell,
    step_start_to_close: Duration,
}

impl JobStateMachine {
    pub fn new(job_id: impl Into<String>, step_start_to_close: Duration) -> Self {
        Self {
            job_id: job_id.into(),
            cell: JobStateCell::new(),
            step_start_to_close,
        }
    }

    pub fn state(&self) -> JobState {
        self.cell.get()
    }

    pub fn cell(&self) -> &JobStateCell {
        &self.cell
    }

    /// Read-only accessor handed to the engine as the state query.
    pub fn state_query(&self) -> impl Fn() -> JobState + Send + Sync + 'static {
        let cell = self.cell.clone();
        move || cell.get()
    }

    /// Fail the job without running the step.
    pub fn fail(&self, reason: &str) -> JobState {
        error!(job_id = %self.job_id, reason, "failed to execute workflow");
        self.cell.settle(false)
    }

    /// Run the workload step under its start-to-close budget and record the
    /// outcome. Faults are terminal; there is no retry here.
    pub async fn drive<F>(&self, step: F) -> JobState
    where
        F: Future<Output = Result<(), WorkloadError>>,
    {
        info!(job_id = %self.job_id, "execute sleep activity");

        let outcome = match tokio::time::timeout(self.step_start_to_close, step).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(StepError::Workload(e)),
            Err(_) => Err(StepError::TimedOut(self.step_start_to_close)),
        };

        match &outcome {
            Ok(()) => info!(job_id = %self.job_id, "workflow complete"),
            Err(e) => error!(job_id = %self.job_id, error = %e, "failed to execute workflow"),
        }

        self.cell.settle(outcome.is_ok())
    }
}
