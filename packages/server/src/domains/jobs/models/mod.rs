pub mod job;
pub mod job_state;

pub use job::*;
pub use job_state::JobState;
