//! CLI command implementations.

pub mod handle;
pub mod metrics;
pub mod produce;
pub mod route;
pub mod validate;
