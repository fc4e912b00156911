//! Kernel module - engine boundary and the gateway the HTTP layer talks to.

pub mod execution;
pub mod gateway;
pub mod memory_engine;
pub mod restate_engine;
pub mod test_dependencies;
pub mod traits;

pub use execution::{EngineError, ExecutionRef, StartExecution, RUN_HANDLER};
pub use gateway::{ExecutionGateway, GatewayError, ENGINE_CALL_TIMEOUT};
pub use memory_engine::{ExecutionContext, InMemoryEngine};
pub use restate_engine::RestateEngine;
pub use traits::*;
