pub mod simulate_workload;

pub use simulate_workload::*;
