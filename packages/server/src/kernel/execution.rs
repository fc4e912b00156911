//! Types exchanged with the durable execution engine.

use typed_builder::TypedBuilder;

use crate::domains::jobs::{ExecutionTimeouts, JobId, WaitingTime};

/// Entry point of the job workflow.
pub const RUN_HANDLER: &str = "run";

/// Request to start one job execution.
#[derive(Debug, Clone, TypedBuilder)]
pub struct StartExecution {
    /// Execution id; the client-supplied job id.
    #[builder(setter(into))]
    pub id: String,
    /// Workflow handler that runs the job.
    #[builder(default = RUN_HANDLER.to_string(), setter(into))]
    pub entry_point: String,
    pub waiting_time: WaitingTime,
    pub timeouts: ExecutionTimeouts,
}

impl StartExecution {
    /// Start request for a job, with budgets derived from its waiting time.
    pub fn for_job(id: &JobId, waiting_time: WaitingTime) -> Self {
        Self::builder()
            .id(id.as_str())
            .waiting_time(waiting_time)
            .timeouts(ExecutionTimeouts::for_workload(waiting_time))
            .build()
    }
}

/// Handle returned by the engine once it has accepted an execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRef {
    pub id: String,
    pub invocation_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("invalid engine url: {0}")]
    InvalidUrl(String),

    #[error("execution {id} is already started")]
    AlreadyStarted { id: String },

    #[error("execution {id} not found")]
    ExecutionNotFound { id: String },

    #[error("execution {id} has no entry point {entry_point:?}")]
    UnknownEntryPoint { id: String, entry_point: String },

    #[error("execution {id} has no query {query:?}")]
    UnknownQuery { id: String, query: String },

    #[error("query {query:?} is already registered")]
    QueryAlreadyRegistered { query: String },

    #[error("engine rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to decode engine response: {0}")]
    Decode(String),
}
