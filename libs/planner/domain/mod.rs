//! Domain value types shared by the IPS calculator and the plan optimizer.
//!
//! Everything here is a plain value: built by the caller, consumed by the
//! core, never mutated after a plan is emitted.

mod card;
mod market;
mod plan;

pub use card::{CardMetrics, HotListEntry, SubstitutionGroup, Tier};
pub use market::{Budget, BudgetMode, Demand, Directive, DirectiveMode, Offer, Shipping};
pub use plan::{
    Basket, BasketItem, BudgetReport, ItemKind, Plan, PlanSummary, UnfilledDemand,
    UnfilledReason,
};

/// Tolerance for money comparisons (sub-cent).
pub const MONEY_EPSILON: f64 = 1e-9;

/// Round a monetary amount to whole cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Replace NaN/inf with zero and clamp negatives to zero.
pub(crate) fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
