//! Job identity, workload parameter and the engine budgets derived from it.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::JobState;

/// Shortest workload a client may submit.
pub const MIN_WAITING_TIME: Duration = Duration::from_secs(30);

/// Time the engine may take to hand a step to a worker.
pub const STEP_SCHEDULE_TO_START: Duration = Duration::from_secs(60);

/// Slack added on top of the workload for start-to-close budgets.
pub const START_TO_CLOSE_SLACK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("job name must not be empty")]
    EmptyName,

    #[error("waiting time must be at least {min}s, got {got}s", min = MIN_WAITING_TIME.as_secs())]
    WaitingTimeTooShort { got: i64 },

    #[error("waiting time of {0}s is out of range")]
    WaitingTimeOutOfRange(i64),
}

/// Client-supplied job identifier, also used as the engine's execution id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn parse(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Length of the simulated workload. Always at least [`MIN_WAITING_TIME`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WaitingTime(Duration);

impl WaitingTime {
    pub fn from_secs(secs: i64) -> Result<Self, ValidationError> {
        let unsigned =
            u64::try_from(secs).map_err(|_| ValidationError::WaitingTimeTooShort { got: secs })?;
        let duration = Duration::from_secs(unsigned);
        if duration < MIN_WAITING_TIME {
            return Err(ValidationError::WaitingTimeTooShort { got: secs });
        }
        // Budgets are carried as milliseconds on the wire.
        if duration
            .checked_add(START_TO_CLOSE_SLACK)
            .and_then(|d| u64::try_from(d.as_millis()).ok())
            .is_none()
        {
            return Err(ValidationError::WaitingTimeOutOfRange(secs));
        }
        Ok(Self(duration))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }
}

/// Engine budgets for one job execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionTimeouts {
    /// Whole execution, from acceptance to terminal state.
    pub execution_start_to_close: Duration,
    /// Wait for a worker to pick up the workload step.
    pub step_schedule_to_start: Duration,
    /// The workload step itself.
    pub step_start_to_close: Duration,
}

impl ExecutionTimeouts {
    pub fn for_workload(waiting_time: WaitingTime) -> Self {
        let start_to_close = waiting_time.as_duration() + START_TO_CLOSE_SLACK;
        Self {
            execution_start_to_close: start_to_close,
            step_schedule_to_start: STEP_SCHEDULE_TO_START,
            step_start_to_close: start_to_close,
        }
    }
}

/// Point-in-time view of a job, fetched from the engine for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReference {
    pub id: String,
    pub state: JobState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_rejects_empty_name() {
        assert_eq!(JobId::parse(""), Err(ValidationError::EmptyName));
        assert_eq!(JobId::parse("job-1").unwrap().as_str(), "job-1");
    }

    #[test]
    fn waiting_time_enforces_minimum() {
        assert_eq!(
            WaitingTime::from_secs(29),
            Err(ValidationError::WaitingTimeTooShort { got: 29 })
        );
        assert_eq!(
            WaitingTime::from_secs(0),
            Err(ValidationError::WaitingTimeTooShort { got: 0 })
        );
        assert_eq!(WaitingTime::from_secs(30).unwrap().as_secs(), 30);
    }

    #[test]
    fn negative_waiting_time_is_too_short() {
        assert_eq!(
            WaitingTime::from_secs(-45),
            Err(ValidationError::WaitingTimeTooShort { got: -45 })
        );
    }

    #[test]
    fn huge_waiting_time_is_out_of_range() {
        assert_eq!(
            WaitingTime::from_secs(i64::MAX),
            Err(ValidationError::WaitingTimeOutOfRange(i64::MAX))
        );
    }

    #[test]
    fn timeouts_add_one_second_of_slack() {
        let timeouts = ExecutionTimeouts::for_workload(WaitingTime::from_secs(30).unwrap());

        assert_eq!(timeouts.execution_start_to_close, Duration::from_secs(31));
        assert_eq!(timeouts.step_start_to_close, Duration::from_secs(31));
        assert_eq!(timeouts.step_schedule_to_start, Duration::from_secs(60));
    }

    #[test]
    fn validation_messages_name_the_limit() {
        let err = WaitingTime::from_secs(10).unwrap_err();
        assert_eq!(err.to_string(), "waiting time must be at least 30s, got 10s");
    }
}
