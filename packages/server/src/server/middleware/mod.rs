// HTTP middleware
pub mod cors_preflight;
pub mod no_cache;

pub use cors_preflight::*;
pub use no_cache::*;
