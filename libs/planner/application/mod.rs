//! Application Layer
//!
//! The two cores: the IPS calculator and the plan optimizer, plus the
//! schema checks callers run before handing input to them.

pub mod ips;
pub mod optimizer;
pub mod validation;

pub use ips::{compute_hot_list, generate_hot_list, HotListRequest, IpsConfig};
pub use optimizer::{run_pipeline, run_pipeline_with_config, OptimizerConfig, PlannerInput};
pub use validation::{
    parse_hot_list_request, parse_planner_input, validate_hot_list_request,
    validate_planner_input, InputError,
};
