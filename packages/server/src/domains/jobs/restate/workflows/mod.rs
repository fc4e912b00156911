//! Jobs domain workflows
//!
//! Durable workflows that run a job's single long-running step.

pub mod run_job;

pub use run_job::*;
