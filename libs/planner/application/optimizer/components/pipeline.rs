//! Optimizer entry points: phases run in order over one working state.

use tracing::debug;

use crate::application::optimizer::config::OptimizerConfig;
use crate::application::optimizer::input::PlannerInput;
use crate::domain::Plan;

use super::allocation::allocate_demands;
use super::filler::pack_filler;
use super::finalize::{enforce_strict_budget, finalize};
use super::normalize::normalize;
use super::state::PlanState;

/// Build a purchase plan with the default optimizer configuration.
///
/// Never fails: unsatisfiable demand, skipped inputs and budget pressure are
/// all reported inside the returned [`Plan`].
pub fn run_pipeline(input: &PlannerInput) -> Plan {
    run_pipeline_with_config(input, &OptimizerConfig::default())
}

/// Build a purchase plan. Deterministic for identical inputs.
pub fn run_pipeline_with_config(input: &PlannerInput, config: &OptimizerConfig) -> Plan {
    let mut normalized = normalize(input, config);
    let mut state = PlanState::new(normalized.budget.clone());

    allocate_demands(&mut normalized, &mut state);

    let allow_filler = input.allow_hot_list_filler(config.allow_hot_list_filler);
    pack_filler(&mut normalized, &mut state, config, allow_filler);

    enforce_strict_budget(&normalized, &mut state);

    let plan = finalize(&normalized, state);
    debug!(
        "[Optimizer] Plan ready: {} unfilled line(s), {} input warning(s)",
        plan.unfilled_demand.len(),
        plan.warnings.len()
    );
    plan
}
