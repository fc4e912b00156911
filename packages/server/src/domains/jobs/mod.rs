//! Jobs domain - asynchronous jobs with a STARTED -> COMPLETED/FAILED lifecycle

pub mod activities;
pub mod machine;
pub mod models;
pub mod restate;

pub use machine::{JobStateCell, JobStateMachine, StepError, STATE_QUERY};
pub use models::{
    ExecutionTimeouts, JobId, JobReference, JobState, ValidationError, WaitingTime,
    MIN_WAITING_TIME,
};
