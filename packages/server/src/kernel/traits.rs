// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no job lifecycle logic.
// The durable engine and the workload step sit behind these seams so the
// HTTP layer and the state machine can run against fakes in tests.
//
// Naming convention: Base* for trait names (e.g., BaseExecutionEngine)

use std::time::Duration;

use async_trait::async_trait;

use super::execution::{EngineError, ExecutionRef, StartExecution};
use crate::domains::jobs::activities::WorkloadError;

// =============================================================================
// Durable Execution Engine Trait (External collaborator)
// =============================================================================

/// The two operations the job service needs from a durable execution engine.
///
/// Both are black-box RPCs. Durability, retries and worker fan-out are the
/// engine's business; callers bound each call with their own timeout.
#[async_trait]
pub trait BaseExecutionEngine: Send + Sync {
    /// Start a new execution named `request.id`.
    ///
    /// Fails with [`EngineError::AlreadyStarted`] when an execution with the
    /// same id is still active.
    async fn start_execution(&self, request: StartExecution) -> Result<ExecutionRef, EngineError>;

    /// Ask a running or finished execution to answer `query`.
    async fn query_execution(&self, id: &str, query: &str)
        -> Result<serde_json::Value, EngineError>;
}

// =============================================================================
// Workload Trait (the job's single long-running step)
// =============================================================================

#[async_trait]
pub trait BaseWorkload: Send + Sync {
    /// Perform the workload for `waiting_time`.
    async fn perform(&self, waiting_time: Duration) -> Result<(), WorkloadError>;
}
