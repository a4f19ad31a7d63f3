//! Card Procurement Planner
//!
//! Scores cards into a prioritized hot list and turns demand, offers and a
//! budget into per-seller purchase baskets.
//!
//! ## Layers
//!
//! - **domain**: plain value types (cards, offers, directives, plans)
//! - **application**: the IPS calculator and the plan optimizer
//! - **infrastructure**: logging and YAML configuration for binaries

pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used items
pub use application::ips::{
    calculate_card_ips, compute_hot_list, filter_eligible_hot_list, generate_hot_list,
    get_shipping_filler_candidates, HotListRequest, IpsConfig,
};
pub use application::optimizer::{
    run_pipeline, run_pipeline_with_config, OptimizerConfig, PlannerInput, PlannerOptions,
};
pub use application::validation::{
    parse_hot_list_request, parse_planner_input, validate_hot_list_request,
    validate_planner_input, InputError,
};
pub use domain::{
    Basket, BasketItem, Budget, BudgetMode, BudgetReport, CardMetrics, Demand, Directive,
    DirectiveMode, HotListEntry, ItemKind, Offer, Plan, PlanSummary, Shipping,
    SubstitutionGroup, Tier, UnfilledDemand, UnfilledReason,
};
pub use infrastructure::{init_tracing, ConfigError, PlannerConfig};
