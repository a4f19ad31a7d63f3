//! Phase 1: demand allocation.
//!
//! Cost-minimizing greedy with per-seller coalescing. Demands are served in
//! priority order; each one repeatedly takes the cheapest eligible lot until
//! it is covered or nothing eligible remains. Residual demand falls back to
//! the reference price, then to `unfilled_demand`.

use std::collections::BTreeSet;

use tracing::debug;

use crate::domain::{ItemKind, Shipping, UnfilledReason, MONEY_EPSILON};

use super::normalize::{DemandTask, NormalizedInput};
use super::state::{shipping_for, BasketStage, PlanState};

/// What stood in the way while serving one demand
#[derive(Debug, Default, Clone, Copy)]
struct Blockers {
    price: bool,
    seller: bool,
    budget: bool,
}

impl Blockers {
    /// Most specific reason wins: budget, seller cap, price cap, then supply
    fn reason(&self) -> UnfilledReason {
        if self.budget {
            UnfilledReason::BudgetExhausted
        } else if self.seller {
            UnfilledReason::SellerCap
        } else if self.price {
            UnfilledReason::PriceCap
        } else {
            UnfilledReason::NoOffers
        }
    }
}

pub(crate) fn allocate_demands(input: &mut NormalizedInput, state: &mut PlanState) {
    let strict = state.budget.as_ref().map_or(false, |b| b.is_strict());
    let tasks = input.demands.clone();

    for task in &tasks {
        let mut remaining = task.quantity;
        let mut blockers = Blockers::default();
        let mut skipped_sellers: BTreeSet<String> = BTreeSet::new();

        while remaining > 0 {
            let Some(lot_index) = select_lot(input, state, task, &skipped_sellers, &mut blockers) else {
                break;
            };
            let (seller_id, price, lot_remaining) = {
                let lot = &input.lots[lot_index];
                (lot.seller_id.clone(), lot.price, lot.remaining)
            };

            let seller_units = seller_cap_units(state, &seller_id, price, strict);
            if seller_units == 0 {
                blockers.seller = true;
                skipped_sellers.insert(seller_id);
                continue;
            }

            let want = remaining.min(lot_remaining).min(seller_units);
            let shipping = input.sellers.get(&seller_id).and_then(|p| p.shipping);
            let units = affordable_units(state, &seller_id, shipping.as_ref(), price, want, strict);
            if units == 0 {
                blockers.budget = true;
                skipped_sellers.insert(seller_id);
                continue;
            }

            let reason = demand_reason(task, price);
            let basket = state.basket_mut(&seller_id, input);
            basket.add(&task.card_id, units, price, ItemKind::Demand, reason);
            basket.advance(BasketStage::Accumulating);
            input.lots[lot_index].remaining -= units;
            remaining -= units;

            debug!(
                "[Allocation] {} x{} @ {:.2} from {} ({} left)",
                task.card_id, units, price, seller_id, remaining
            );
        }

        if remaining > 0 {
            let units = reference_fallback(input, state, task, remaining, &mut blockers);
            remaining -= units;
        }

        if remaining > 0 {
            let reason = blockers.reason();
            debug!(
                "[Allocation] {} unfilled: {} unit(s), reason={}",
                task.card_id, remaining, reason
            );
            state.record_unfilled(&task.card_id, remaining, reason);
        }
    }
}

/// Price passes the per-card cap and, unless forced, both the demand's max
/// price and the card's reference price
pub(crate) fn price_allowed(input: &NormalizedInput, task: &DemandTask, price: f64) -> bool {
    if !input.within_card_cap(price) {
        return false;
    }
    if task.forced {
        return true;
    }
    task.max_price.map_or(true, |max_price| price <= max_price + MONEY_EPSILON)
        && input.within_reference_price(&task.card_id, price)
}

/// Cheapest eligible lot; ties go to the seller nearest its free-shipping
/// threshold from below, then to the lowest seller id.
fn select_lot(
    input: &NormalizedInput,
    state: &PlanState,
    task: &DemandTask,
    skipped_sellers: &BTreeSet<String>,
    blockers: &mut Blockers,
) -> Option<usize> {
    let indices = input.lots_by_card.get(&task.card_id)?;
    let mut best: Option<(usize, f64)> = None;

    for &index in indices {
        let lot = &input.lots[index];
        if lot.remaining == 0 || skipped_sellers.contains(&lot.seller_id) {
            continue;
        }
        if !price_allowed(input, task, lot.price) {
            blockers.price = true;
            continue;
        }
        let gap = free_shipping_gap(input, state, &lot.seller_id);
        let better = match best {
            None => true,
            Some((best_index, best_gap)) => {
                let incumbent = &input.lots[best_index];
                lot.price
                    .total_cmp(&incumbent.price)
                    .then_with(|| gap.total_cmp(&best_gap))
                    .then_with(|| lot.seller_id.cmp(&incumbent.seller_id))
                    .is_lt()
            }
        };
        if better {
            best = Some((index, gap));
        }
    }

    best.map(|(index, _)| index)
}

/// Distance from the seller's current subtotal up to its free-shipping
/// threshold; infinite when there is no threshold or it is already reached.
fn free_shipping_gap(input: &NormalizedInput, state: &PlanState, seller_id: &str) -> f64 {
    let free_at = input
        .sellers
        .get(seller_id)
        .and_then(|p| p.shipping)
        .and_then(|s| s.free_at);
    match free_at {
        Some(threshold) => {
            let subtotal = state.subtotal_of(seller_id);
            if subtotal < threshold - MONEY_EPSILON {
                threshold - subtotal
            } else {
                f64::INFINITY
            }
        }
        None => f64::INFINITY,
    }
}

/// Units the per-seller cap still admits at `price`
pub(crate) fn seller_cap_units(state: &PlanState, seller_id: &str, price: f64, enforce: bool) -> u32 {
    if !enforce {
        return u32::MAX;
    }
    let Some(cap) = state.budget.as_ref().and_then(|b| b.max_per_seller) else {
        return u32::MAX;
    };
    let room = cap - state.subtotal_of(seller_id);
    if room < -MONEY_EPSILON {
        return 0;
    }
    if price <= MONEY_EPSILON {
        return u32::MAX;
    }
    units_within(room, price)
}

/// Largest quantity (≤ want) whose cost, shipping included, fits the total cap
fn affordable_units(
    state: &PlanState,
    seller_id: &str,
    shipping: Option<&Shipping>,
    price: f64,
    want: u32,
    strict: bool,
) -> u32 {
    if !strict || want == 0 {
        return want;
    }
    let Some(max_total) = state.budget.as_ref().and_then(|b| b.max_total_spend) else {
        return want;
    };

    let subtotal = state.subtotal_of(seller_id);
    let current_shipping = state.shipping_of(seller_id);
    let cost = |q: u32| {
        let added = price * q as f64;
        added + shipping_for(shipping, subtotal + added) - current_shipping
    };

    if price <= MONEY_EPSILON {
        // Only shipping moves
        return if state.non_fallback_fits(cost(want)) { want } else { 0 };
    }

    let outside_reserve = state
        .budget
        .as_ref()
        .and_then(|b| b.spendable_outside_reserve())
        .unwrap_or(max_total);
    let headroom = (max_total - state.total_spend())
        .min(outside_reserve - state.non_fallback_spend())
        + current_shipping;
    if headroom < -MONEY_EPSILON {
        return 0;
    }
    // Largest quantity if shipping ends up free, then if it is still charged
    let free_bound = want.min(units_within(headroom, price));
    if free_bound > 0 && state.non_fallback_fits(cost(free_bound)) {
        return free_bound;
    }
    let base = shipping.map_or(0.0, |s| s.base_cost());
    let charged_bound = free_bound.min(units_within(headroom - base, price));

    // Rounding slack only; the bound is already within a unit of the answer
    (charged_bound.saturating_sub(1)..=charged_bound)
        .rev()
        .find(|&q| q > 0 && state.non_fallback_fits(cost(q)))
        .unwrap_or(0)
}

/// Cover residual demand at the reference price. Returns the units granted.
fn reference_fallback(
    input: &NormalizedInput,
    state: &mut PlanState,
    task: &DemandTask,
    remaining: u32,
    blockers: &mut Blockers,
) -> u32 {
    let Some(&price) = input.reference_prices.get(&task.card_id) else {
        return 0;
    };
    if !price_allowed(input, task, price) {
        blockers.price = true;
        return 0;
    }

    let seller_id = input.reference_seller_id.clone();
    let cap_units = seller_cap_units(state, &seller_id, price, true);
    if cap_units < remaining {
        blockers.seller = true;
    }
    let want = remaining.min(cap_units);

    let units = match state.budget.as_ref().and_then(|b| b.max_total_spend) {
        Some(max_total) if price > MONEY_EPSILON => {
            let headroom = max_total - state.total_spend();
            if headroom < -MONEY_EPSILON {
                0
            } else {
                want.min(units_within(headroom, price))
            }
        }
        _ => want,
    };
    if units < want {
        blockers.budget = true;
    }
    if units == 0 {
        return 0;
    }

    let reason = format!(
        "No acceptable marketplace offer; reference fallback at {:.2}",
        price
    );
    let basket = state.basket_mut(&seller_id, input);
    basket.add(&task.card_id, units, price, ItemKind::ReserveFallback, reason);
    basket.advance(BasketStage::Accumulating);

    debug!(
        "[Allocation] {} x{} @ {:.2} from reference fallback",
        task.card_id, units, price
    );
    units
}

fn units_within(room: f64, price: f64) -> u32 {
    let units = ((room + MONEY_EPSILON) / price).floor();
    if units <= 0.0 {
        0
    } else if units >= u32::MAX as f64 {
        u32::MAX
    } else {
        units as u32
    }
}

fn demand_reason(task: &DemandTask, price: f64) -> String {
    let mut reason = format!("Demand: cheapest eligible offer at {:.2}", price);
    if task.forced {
        if let Some(max_price) = task.max_price {
            if price > max_price + MONEY_EPSILON {
                reason.push_str(&format!(" (FORCE directive, above maxPrice {:.2})", max_price));
            }
        }
    }
    if task.preferred {
        reason.push_str(" (PREFER directive)");
    }
    reason
}
