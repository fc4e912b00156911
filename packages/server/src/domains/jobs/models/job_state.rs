use std::fmt;

use serde::{Deserialize, Serialize};

use crate::impl_restate_json;

/// Lifecycle state of a job.
///
/// `Started` is the only non-terminal state. Once a job is `Completed` or
/// `Failed` it never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum JobState {
    #[default]
    Started = 0,
    Completed = 1,
    Failed = 2,
}

impl_restate_json!(JobState);

impl JobState {
    /// Human-readable name reported by the result endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Started => "started",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Started)
    }

    /// State reached once the workload step has finished.
    ///
    /// Terminal states absorb every later outcome.
    pub fn settle(self, step_succeeded: bool) -> JobState {
        match self {
            JobState::Started if step_succeeded => JobState::Completed,
            JobState::Started => JobState::Failed,
            terminal => terminal,
        }
    }

    pub(crate) fn from_repr(value: u8) -> Option<JobState> {
        match value {
            0 => Some(JobState::Started),
            1 => Some(JobState::Completed),
            2 => Some(JobState::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
