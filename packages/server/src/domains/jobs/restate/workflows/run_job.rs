//! Durable job workflow
//!
//! One workflow per job, keyed by the job id. `run` records STARTED before
//! the step begins, executes the simulated workload as a durable step, then
//! records the terminal state. The shared `state` handler is the state query
//! and is callable at any time, including while `run` is still in flight.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use restate_sdk::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::common::EmptyRequest;
use crate::domains::jobs::activities::SimulatedWorkload;
use crate::domains::jobs::models::{ExecutionTimeouts, JobState, WaitingTime};
use crate::impl_restate_json;
use crate::kernel::BaseWorkload;

/// Workflow state key holding the current [`JobState`].
const STATE_KEY: &str = "state";

// =============================================================================
// Request / Response types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunJobRequest {
    pub waiting_time_ms: u64,
    pub schedule_to_start_ms: u64,
    pub start_to_close_ms: u64,
    pub execution_start_to_close_ms: u64,
    pub submitted_at: DateTime<Utc>,
}

impl_restate_json!(RunJobRequest);

impl RunJobRequest {
    pub fn new(
        waiting_time: WaitingTime,
        timeouts: ExecutionTimeouts,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            waiting_time_ms: duration_ms(waiting_time.as_duration()),
            schedule_to_start_ms: duration_ms(timeouts.step_schedule_to_start),
            start_to_close_ms: duration_ms(timeouts.step_start_to_close),
            execution_start_to_close_ms: duration_ms(timeouts.execution_start_to_close),
            submitted_at,
        }
    }

    pub fn waiting_time(&self) -> Duration {
        Duration::from_millis(self.waiting_time_ms)
    }

    /// Budget left for the step at `now_ms`: the step's own start-to-close,
    /// capped by what remains of the execution budget counted from
    /// `started_at_ms`.
    pub fn step_budget(&self, started_at_ms: i64, now_ms: i64) -> Duration {
        let elapsed = u64::try_from(now_ms.saturating_sub(started_at_ms)).unwrap_or(0);
        let remaining = self.execution_start_to_close_ms.saturating_sub(elapsed);
        Duration::from_millis(self.start_to_close_ms.min(remaining))
    }

    /// Whether the workflow began running later than its schedule-to-start
    /// budget allows.
    pub fn missed_schedule_to_start(&self, started_at_ms: i64) -> bool {
        let waited = started_at_ms.saturating_sub(self.submitted_at.timestamp_millis());
        u64::try_from(waited).is_ok_and(|waited| waited > self.schedule_to_start_ms)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunJobResult {
    pub state: JobState,
}

impl_restate_json!(RunJobResult);

// =============================================================================
// Workflow definition
// =============================================================================

#[restate_sdk::workflow]
#[name = "JobWorkflow"]
pub trait JobWorkflow {
    async fn run(req: RunJobRequest) -> Result<RunJobResult, HandlerError>;

    #[shared]
    async fn state(req: EmptyRequest) -> Result<JobState, HandlerError>;
}

pub struct JobWorkflowImpl {
    workload: Arc<dyn BaseWorkload>,
}

impl Default for JobWorkflowImpl {
    fn default() -> Self {
        Self::with_workload(Arc::new(SimulatedWorkload))
    }
}

impl JobWorkflowImpl {
    pub fn with_workload(workload: Arc<dyn BaseWorkload>) -> Self {
        Self { workload }
    }
}

impl JobWorkflow for JobWorkflowImpl {
    async fn run(
        &self,
        ctx: WorkflowContext<'_>,
        req: RunJobRequest,
    ) -> Result<RunJobResult, HandlerError> {
        let job_id = ctx.key().to_string();
        info!(job_id = %job_id, "workflow start");

        // The query must see STARTED before the step begins.
        ctx.set(STATE_KEY, JobState::Started);

        let started_at_ms: i64 = ctx
            .run(|| async { Ok(Utc::now().timestamp_millis()) })
            .await?;

        if req.missed_schedule_to_start(started_at_ms) {
            error!(
                job_id = %job_id,
                schedule_to_start_ms = req.schedule_to_start_ms,
                "failed to execute workflow: step was not started in time"
            );
            ctx.set(STATE_KEY, JobState::Failed);
            return Ok(RunJobResult {
                state: JobState::Failed,
            });
        }

        info!(job_id = %job_id, "execute sleep activity");

        let workload = self.workload.clone();
        let waiting_time = req.waiting_time();

        let outcome = ctx
            .run(|| async move {
                let budget = req.step_budget(started_at_ms, Utc::now().timestamp_millis());
                match tokio::time::timeout(budget, workload.perform(waiting_time)).await {
                    Ok(Ok(())) => Ok(true),
                    Ok(Err(e)) => Err(TerminalError::new(e.to_string()).into()),
                    Err(_) => Err(TerminalError::new(format!(
                        "step exceeded its remaining budget of {budget:?}"
                    ))
                    .into()),
                }
            })
            .await;

        let state = JobState::Started.settle(outcome.is_ok());
        match &outcome {
            Ok(_) => info!(job_id = %job_id, "workflow complete"),
            Err(e) => error!(job_id = %job_id, error = %e, "failed to execute workflow"),
        }

        ctx.set(STATE_KEY, state);

        Ok(RunJobResult { state })
    }

    async fn state(
        &self,
        ctx: SharedWorkflowContext<'_>,
        _req: EmptyRequest,
    ) -> Result<JobState, HandlerError> {
        match ctx.get::<JobState>(STATE_KEY).await? {
            Some(state) => Ok(state),
            None => Err(TerminalError::new_with_code(
                404,
                format!("job {} has not been started", ctx.key()),
            )
            .into()),
        }
    }
}
