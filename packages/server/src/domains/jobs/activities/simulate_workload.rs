//! The single long-running step of a job: wait for the requested duration.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::kernel::BaseWorkload;

#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkloadError {
    #[error("workload aborted: {0}")]
    Aborted(String),
}

/// Sleep for `waiting_time`, standing in for real work.
pub async fn simulate_workload(waiting_time: Duration) {
    info!(waiting_time = ?waiting_time, "waiting time");
    tokio::time::sleep(waiting_time).await;
}

/// Production workload used by both engines.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedWorkload;

#[async_trait]
impl BaseWorkload for SimulatedWorkload {
    async fn perform(&self, waiting_time: Duration) -> Result<(), WorkloadError> {
        simulate_workload(waiting_time).await;
        Ok(())
    }
}
