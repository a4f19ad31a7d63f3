//! IPS Calculator
//!
//! Scores cards by demand, liquidity, substitutability and margin safety,
//! independent of marketplace offers, and ranks them into a hot list.

mod config;
mod hot_list;
mod scoring;

pub use config::{DemandCaps, DemandWeights, IpsConfig};
pub use hot_list::{
    compute_hot_list, filter_eligible_hot_list, generate_hot_list,
    get_shipping_filler_candidates, hot_list_order, HotListRequest,
};
pub use scoring::{
    calculate_card_ips, calculate_demand_rate, calculate_liquidity, calculate_margin_safety,
    calculate_substitutability, calculate_target_inventory, determine_tier,
    group_substitutability,
};
