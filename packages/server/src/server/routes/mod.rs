// HTTP routes
pub mod workflow;

pub use workflow::*;
