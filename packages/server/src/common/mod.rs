// Common types shared by the workflow endpoint and the HTTP façade

pub mod restate_serde;
pub mod restate_types;

pub use restate_types::*;
