//! Infrastructure Layer
//!
//! Logging setup and YAML configuration for binaries. The cores in
//! `application` never touch either.

pub mod config;
pub mod logging;

pub use config::{ConfigError, PlannerConfig};
pub use logging::init_tracing;
