//! Card Procurement - Main Library
//!
//! Re-exports the planner workspace library and hosts the helpers shared by
//! binaries.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (config paths, args)
//! - **planner**: IPS calculator and plan optimizer (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust
//! use card_procurement::bin_common::{load_config_from_env, ConfigType};
//! use card_procurement::planner::{run_pipeline, PlannerConfig};
//! ```

// Re-export workspace libraries for convenience
pub use planner;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;

    pub use cli::{load_config_from_env, parse_args, ConfigType, RunMode};
}
