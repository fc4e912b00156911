// Test doubles for the engine and workload seams.
//
// Used by unit tests in this crate and by the integration tests under tests/.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::execution::{EngineError, ExecutionRef, StartExecution};
use super::traits::{BaseExecutionEngine, BaseWorkload};
use crate::domains::jobs::activities::WorkloadError;

// =============================================================================
// Workloads
// =============================================================================

/// Workload that aborts after a fixed delay.
pub struct FailingWorkload {
    after: Duration,
}

impl FailingWorkload {
    pub fn after_secs(secs: u64) -> Self {
        Self {
            after: Duration::from_secs(secs),
        }
    }
}

#[async_trait]
impl BaseWorkload for FailingWorkload {
    async fn perform(&self, _waiting_time: Duration) -> Result<(), WorkloadError> {
        tokio::time::sleep(self.after).await;
        Err(WorkloadError::Aborted("injected failure".to_string()))
    }
}

// =============================================================================
// Engines
// =============================================================================

/// Engine whose calls never return.
pub struct HangingEngine;

#[async_trait]
impl BaseExecutionEngine for HangingEngine {
    async fn start_execution(&self, _request: StartExecution) -> Result<ExecutionRef, EngineError> {
        std::future::pending().await
    }

    async fn query_execution(
        &self,
        _id: &str,
        _query: &str,
    ) -> Result<serde_json::Value, EngineError> {
        std::future::pending().await
    }
}

/// Engine that cannot be reached.
pub struct UnavailableEngine;

#[async_trait]
impl BaseExecutionEngine for UnavailableEngine {
    async fn start_execution(&self, _request: StartExecution) -> Result<ExecutionRef, EngineError> {
        Err(EngineError::Unavailable("connection refused".to_string()))
    }

    async fn query_execution(
        &self,
        _id: &str,
        _query: &str,
    ) -> Result<serde_json::Value, EngineError> {
        Err(EngineError::Unavailable("connection refused".to_string()))
    }
}

/// Engine that accepts every start and answers every query with a fixed value.
pub struct StaticEngine {
    answer: Option<serde_json::Value>,
    started: Mutex<Vec<StartExecution>>,
}

impl StaticEngine {
    /// Engine that knows no executions.
    pub fn empty() -> Self {
        Self {
            answer: None,
            started: Mutex::new(Vec::new()),
        }
    }

    pub fn answering(answer: serde_json::Value) -> Self {
        Self {
            answer: Some(answer),
            started: Mutex::new(Vec::new()),
        }
    }

    /// Start requests received so far.
    pub fn started(&self) -> Vec<StartExecution> {
        self.started.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl BaseExecutionEngine for StaticEngine {
    async fn start_execution(&self, request: StartExecution) -> Result<ExecutionRef, EngineError> {
        let execution = ExecutionRef {
            id: request.id.clone(),
            invocation_id: None,
        };
        self.started
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
        Ok(execution)
    }

    async fn query_execution(
        &self,
        id: &str,
        _query: &str,
    ) -> Result<serde_json::Value, EngineError> {
        self.answer
            .clone()
            .ok_or_else(|| EngineError::ExecutionNotFound { id: id.to_string() })
    }
}
