//! In-process execution engine.
//!
//! Runs every execution as a tokio task on the local runtime and answers
//! state queries from the execution's own state cell. Nothing is persisted, so
//! executions do not survive a restart; use it for local development
//! (`ENGINE_BACKEND=memory`) and as the engine double in tests. On a paused
//! tokio clock it advances on simulated time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{error, info};

use super::execution::{EngineError, ExecutionRef, StartExecution, RUN_HANDLER};
use super::traits::{BaseExecutionEngine, BaseWorkload};
use crate::domains::jobs::activities::SimulatedWorkload;
use crate::domains::jobs::{JobStateMachine, STATE_QUERY};

type QueryHandler = Arc<dyn Fn() -> serde_json::Value + Send + Sync>;

/// Activation record of one execution.
pub struct ExecutionContext {
    id: String,
    queries: RwLock<HashMap<String, QueryHandler>>,
    finished: AtomicBool,
}

impl ExecutionContext {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            queries: RwLock::new(HashMap::new()),
            finished: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Expose a synchronous, read-only query under `name`.
    pub fn register_query<F>(&self, name: &str, handler: F) -> Result<(), EngineError>
    where
        F: Fn() -> serde_json::Value + Send + Sync + 'static,
    {
        let mut queries = self.queries.write().unwrap_or_else(|e| e.into_inner());
        if queries.contains_key(name) {
            return Err(EngineError::QueryAlreadyRegistered {
                query: name.to_string(),
            });
        }
        queries.insert(name.to_string(), Arc::new(handler));
        Ok(())
    }

    fn query(&self, name: &str) -> Option<serde_json::Value> {
        let handler = self
            .queries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()?;
        Some(handler())
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    fn finish(&self) {
        self.finished.store(true, Ordering::Release);
    }
}

/// Engine that keeps executions in memory.
pub struct InMemoryEngine {
    executions: RwLock<HashMap<String, Arc<ExecutionContext>>>,
    workers: Arc<Semaphore>,
    workload: Arc<dyn BaseWorkload>,
}

impl InMemoryEngine {
    /// Engine running the simulated workload on `worker_slots` concurrent
    /// workers.
    pub fn new(worker_slots: usize) -> Self {
        Self::with_workload(worker_slots, Arc::new(SimulatedWorkload))
    }

    pub fn with_workload(worker_slots: usize, workload: Arc<dyn BaseWorkload>) -> Self {
        Self {
            executions: RwLock::new(HashMap::new()),
            workers: Arc::new(Semaphore::new(worker_slots)),
            workload,
        }
    }

    /// Number of executions ever accepted and still retained.
    pub fn execution_count(&self) -> usize {
        self.executions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn find(&self, id: &str) -> Option<Arc<ExecutionContext>> {
        self.executions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }
}

#[async_trait]
impl BaseExecutionEngine for InMemoryEngine {
    async fn start_execution(&self, request: StartExecution) -> Result<ExecutionRef, EngineError> {
        if request.entry_point != RUN_HANDLER {
            return Err(EngineError::UnknownEntryPoint {
                id: request.id,
                entry_point: request.entry_point,
            });
        }

        let context = Arc::new(ExecutionContext::new(&request.id));
        let machine = JobStateMachine::new(&request.id, request.timeouts.step_start_to_close);

        // The state query must be answerable as soon as the id is visible.
        let query = machine.state_query();
        if let Err(e) = context.register_query(STATE_QUERY, move || {
            serde_json::Value::from(query().as_str())
        }) {
            machine.fail(&e.to_string());
            return Err(e);
        }

        {
            let mut executions = self.executions.write().unwrap_or_else(|e| e.into_inner());
            // Ids are unique among active executions; a finished one may be replaced.
            if executions
                .get(&request.id)
                .is_some_and(|existing| !existing.is_finished())
            {
                return Err(EngineError::AlreadyStarted { id: request.id });
            }
            executions.insert(request.id.clone(), context.clone());
        }

        let execution = ExecutionRef {
            id: request.id.clone(),
            invocation_id: None,
        };

        tokio::spawn(run_execution(
            context,
            machine,
            request,
            self.workers.clone(),
            self.workload.clone(),
        ));

        Ok(execution)
    }

    async fn query_execution(
        &self,
        id: &str,
        query: &str,
    ) -> Result<serde_json::Value, EngineError> {
        let context = self.find(id).ok_or_else(|| EngineError::ExecutionNotFound {
            id: id.to_string(),
        })?;

        context.query(query).ok_or_else(|| EngineError::UnknownQuery {
            id: id.to_string(),
            query: query.to_string(),
        })
    }
}

/// Body of one job execution.
async fn run_execution(
    context: Arc<ExecutionContext>,
    machine: JobStateMachine,
    request: StartExecution,
    workers: Arc<Semaphore>,
    workload: Arc<dyn BaseWorkload>,
) {
    info!(job_id = %context.id(), "workflow start");

    let execution = async {
        let permit = match tokio::time::timeout(
            request.timeouts.step_schedule_to_start,
            workers.acquire(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return machine.fail("worker pool is closed"),
            Err(_) => return machine.fail("step was not started in time"),
        };

        let state = machine
            .drive(workload.perform(request.waiting_time.as_duration()))
            .await;
        drop(permit);
        state
    };

    if tokio::time::timeout(request.timeouts.execution_start_to_close, execution)
        .await
        .is_err()
    {
        error!(job_id = %context.id(), "execution exceeded its start-to-close budget");
        machine.fail("execution timed out");
    }

    context.finish();
}
