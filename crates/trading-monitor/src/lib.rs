//! Logging for the pipeline services.

mod logging;

pub use logging::{env_filter, setup_logging, LogGuard};
