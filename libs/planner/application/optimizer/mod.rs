//! Plan Optimizer
//!
//! Turns demands, directives, offers, a hot list and a budget into per-seller
//! baskets with budget accounting.

pub mod components;
pub mod config;
pub mod input;

pub use components::{run_pipeline, run_pipeline_with_config};
pub use config::{OptimizerConfig, REFERENCE_MARKETPLACE};
pub use input::{PlannerInput, PlannerOptions};
