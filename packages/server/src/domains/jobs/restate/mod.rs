pub mod workflows;

pub use workflows::*;
