//! Execution gateway
//!
//! Adapts job operations onto the engine: `submit` starts an execution and
//! `find_by_id` queries its state. Every engine call is bounded so a stuck
//! engine fails the request instead of hanging it; the bound cancels only the
//! request's call, never the execution itself.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::execution::StartExecution;
use super::traits::BaseExecutionEngine;
use crate::domains::jobs::{JobId, JobReference, JobState, WaitingTime, STATE_QUERY};

/// Bound on a single engine round-trip.
pub const ENGINE_CALL_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The engine did not accept the job.
    #[error("{0}")]
    Submission(String),

    /// The job does not exist or its state could not be read.
    #[error("{0}")]
    NotFound(String),
}

#[derive(Clone)]
pub struct ExecutionGateway {
    engine: Arc<dyn BaseExecutionEngine>,
    call_timeout: Duration,
}

impl ExecutionGateway {
    pub fn new(engine: Arc<dyn BaseExecutionEngine>) -> Self {
        Self::with_call_timeout(engine, ENGINE_CALL_TIMEOUT)
    }

    pub fn with_call_timeout(engine: Arc<dyn BaseExecutionEngine>, call_timeout: Duration) -> Self {
        Self {
            engine,
            call_timeout,
        }
    }

    /// Start a new execution named after the job.
    pub async fn submit(
        &self,
        id: &JobId,
        waiting_time: WaitingTime,
    ) -> Result<JobReference, GatewayError> {
        let request = StartExecution::for_job(id, waiting_time);
        debug!(job_id = %id, waiting_secs = waiting_time.as_secs(), "submitting job");

        match tokio::time::timeout(self.call_timeout, self.engine.start_execution(request)).await {
            Ok(Ok(execution)) => Ok(JobReference {
                id: execution.id,
                state: JobState::Started,
            }),
            Ok(Err(e)) => Err(GatewayError::Submission(e.to_string())),
            Err(_) => Err(GatewayError::Submission(format!(
                "timed out after {:?} starting job {id}",
                self.call_timeout
            ))),
        }
    }

    /// Read the current state of the job's execution.
    pub async fn find_by_id(&self, id: &str) -> Result<JobReference, GatewayError> {
        let value = match tokio::time::timeout(
            self.call_timeout,
            self.engine.query_execution(id, STATE_QUERY),
        )
        .await
        {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => return Err(GatewayError::NotFound(e.to_string())),
            Err(_) => {
                return Err(GatewayError::NotFound(format!(
                    "timed out after {:?} querying job {id}",
                    self.call_timeout
                )))
            }
        };

        let state: JobState = serde_json::from_value(value).map_err(|e| {
            GatewayError::NotFound(format!("failed to decode state of job {id}: {e}"))
        })?;

        Ok(JobReference {
            id: id.to_string(),
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::kernel::test_dependencies::{HangingEngine, StaticEngine, UnavailableEngine};
    use crate::kernel::InMemoryEngine;

    fn job(id: &str) -> JobId {
        JobId::parse(id).unwrap()
    }

    fn thirty_secs() -> WaitingTime {
        WaitingTime::from_secs(30).unwrap()
    }

    #[tokio::test]
    async fn submit_returns_a_started_reference() {
        let engine = Arc::new(StaticEngine::empty());
        let gateway = ExecutionGateway::new(engine.clone());

        let reference = gateway.submit(&job("job-1"), thirty_secs()).await.unwrap();

        assert_eq!(reference.id, "job-1");
        assert_eq!(reference.state, JobState::Started);

        let started = engine.started();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].timeouts.execution_start_to_close, Duration::from_secs(31));
        assert_eq!(started[0].timeouts.step_schedule_to_start, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_submission_is_a_submission_error() {
        let gateway = ExecutionGateway::new(Arc::new(InMemoryEngine::new(4)));
        gateway.submit(&job("job-1"), thirty_secs()).await.unwrap();

        let err = gateway.submit(&job("job-1"), thirty_secs()).await.unwrap_err();

        assert!(matches!(err, GatewayError::Submission(msg) if msg.contains("already started")));
    }

    #[tokio::test]
    async fn unreachable_engine_is_a_submission_error() {
        let gateway = ExecutionGateway::new(Arc::new(UnavailableEngine));

        let err = gateway.submit(&job("job-1"), thirty_secs()).await.unwrap_err();

        assert!(matches!(err, GatewayError::Submission(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_submission_times_out() {
        let gateway = ExecutionGateway::new(Arc::new(HangingEngine));
        let started = tokio::time::Instant::now();

        let err = gateway.submit(&job("job-1"), thirty_secs()).await.unwrap_err();

        assert!(matches!(err, GatewayError::Submission(msg) if msg.contains("timed out")));
        assert!(started.elapsed() >= ENGINE_CALL_TIMEOUT);
    }

    #[tokio::test]
    async fn find_by_id_decodes_the_state() {
        let gateway = ExecutionGateway::new(Arc::new(StaticEngine::answering(json!("failed"))));

        let reference = gateway.find_by_id("job-1").await.unwrap();

        assert_eq!(reference.id, "job-1");
        assert_eq!(reference.state, JobState::Failed);
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let gateway = ExecutionGateway::new(Arc::new(StaticEngine::empty()));

        let err = gateway.find_by_id("missing").await.unwrap_err();

        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn undecodable_state_is_not_found() {
        let gateway = ExecutionGateway::new(Arc::new(StaticEngine::answering(json!({"x": 1}))));

        let err = gateway.find_by_id("job-1").await.unwrap_err();

        assert!(matches!(err, GatewayError::NotFound(msg) if msg.contains("decode")));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_lookup_times_out_as_not_found() {
        let gateway = ExecutionGateway::new(Arc::new(HangingEngine));

        let err = gateway.find_by_id("job-1").await.unwrap_err();

        assert!(matches!(err, GatewayError::NotFound(msg) if msg.contains("timed out")));
    }
}
