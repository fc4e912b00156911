// Durable Job Service - Core
//
// Long-running jobs behind a stateless HTTP façade. Jobs execute as durable
// Restate workflows; clients submit, poll the status endpoint, then fetch the
// result. The engine is the only writer of job state.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
