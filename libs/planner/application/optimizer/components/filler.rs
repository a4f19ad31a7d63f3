//! Phase 2: free-shipping packing with hot-list filler.
//!
//! A basket below its seller's `freeAt` threshold receives filler only when
//! the filler carries it across the threshold and the overshoot past `freeAt`
//! stays below the shipping it saves. A single card crossing the line is
//! preferred (cheapest crossing wins); otherwise cards are combined in
//! hot-list order.

use tracing::debug;

use crate::application::optimizer::config::OptimizerConfig;
use crate::domain::{ItemKind, MONEY_EPSILON};

use super::normalize::{FillerCandidate, NormalizedInput};
use super::state::{BasketStage, PlanState};

/// One filler line considered for a basket
#[derive(Debug, Clone)]
struct FillerPick {
    pool_index: usize,
    lot_index: usize,
    price: f64,
    units: u32,
}

impl FillerPick {
    fn cost(&self) -> f64 {
        self.price * self.units as f64
    }
}

/// Threshold facts of a basket still paying for shipping
#[derive(Debug, Clone, Copy)]
struct Gap {
    subtotal: f64,
    free_at: f64,
    base: f64,
}

impl Gap {
    fn remaining(&self, added: f64) -> f64 {
        self.free_at - self.subtotal - added
    }

    fn crosses(&self, added: f64) -> bool {
        self.remaining(added) <= MONEY_EPSILON
    }

    /// Overshoot past the threshold stays below the shipping saved
    fn profitable(&self, added: f64) -> bool {
        self.subtotal + added - self.free_at < self.base - MONEY_EPSILON
    }
}

pub(crate) fn pack_filler(
    input: &mut NormalizedInput,
    state: &mut PlanState,
    config: &OptimizerConfig,
    allow: bool,
) {
    if !allow {
        debug!("[Filler] Hot-list filler disabled");
        return;
    }
    if input.filler_pool.is_empty() {
        return;
    }

    let sellers: Vec<String> = state
        .baskets
        .values()
        .filter(|b| !b.is_reference && !b.items.is_empty())
        .map(|b| b.seller_id.clone())
        .collect();

    for seller_id in sellers {
        let Some(gap) = basket_gap(state, &seller_id) else {
            continue;
        };

        let picks = match cheapest_single_crossing(input, state, &seller_id, gap) {
            Some(pick) => vec![pick],
            None => match greedy_combination(input, state, config, &seller_id, gap) {
                Some(picks) => picks,
                None => {
                    debug!(
                        "[Filler] {}: no profitable filler for a gap of {:.2}",
                        seller_id,
                        gap.remaining(0.0)
                    );
                    continue;
                }
            },
        };

        commit(input, state, &seller_id, gap, picks);
    }
}

fn basket_gap(state: &PlanState, seller_id: &str) -> Option<Gap> {
    let basket = state.baskets.get(seller_id)?;
    let shipping = basket.shipping?;
    let free_at = shipping.free_at?;
    let base = shipping.base_cost();
    let subtotal = basket.subtotal();
    if base <= MONEY_EPSILON || subtotal >= free_at - MONEY_EPSILON {
        return None;
    }
    Some(Gap {
        subtotal,
        free_at,
        base,
    })
}

/// Cheapest lot of a card at a seller that clears the price caps
fn cheapest_lot(input: &NormalizedInput, card_id: &str, seller_id: &str) -> Option<usize> {
    input
        .lots_by_card
        .get(card_id)?
        .iter()
        .copied()
        .find(|&i| {
            let lot = &input.lots[i];
            lot.seller_id == seller_id
                && lot.remaining > 0
                && lot.price > MONEY_EPSILON
                && input.filler_price_allowed(card_id, lot.price)
        })
}

/// Units a candidate may still contribute, plan-wide
fn units_left(state: &PlanState, candidate: &FillerCandidate) -> u32 {
    let bought = state.units_of(&candidate.entry.card_id, ItemKind::HotFiller);
    candidate.max_units.saturating_sub(bought)
}

/// Budget caps for `added` filler spend on one seller
fn within_caps(state: &PlanState, seller_id: &str, gap: Gap, added: f64) -> bool {
    let Some(budget) = &state.budget else {
        return true;
    };
    if let Some(max_spec) = budget.max_speculative_spend {
        if state.spend_of(ItemKind::HotFiller) + added > max_spec + MONEY_EPSILON {
            return false;
        }
    }
    if let Some(max_seller) = budget.max_per_seller {
        if state.subtotal_of(seller_id) + added > max_seller + MONEY_EPSILON {
            return false;
        }
    }
    // Crossing the threshold drops the basket's shipping charge
    let delta = if gap.crosses(added) { added - gap.base } else { added };
    state.non_fallback_fits(delta)
}

fn cheapest_single_crossing(
    input: &NormalizedInput,
    state: &PlanState,
    seller_id: &str,
    gap: Gap,
) -> Option<FillerPick> {
    let mut best: Option<FillerPick> = None;

    for (pool_index, candidate) in input.filler_pool.iter().enumerate() {
        let Some(lot_index) = cheapest_lot(input, &candidate.entry.card_id, seller_id) else {
            continue;
        };
        let lot = &input.lots[lot_index];
        let needed = ((gap.remaining(0.0) - MONEY_EPSILON) / lot.price).ceil().max(1.0);
        let available = units_left(state, candidate).min(lot.remaining);
        if needed > available as f64 {
            continue;
        }
        let pick = FillerPick {
            pool_index,
            lot_index,
            price: lot.price,
            units: needed as u32,
        };
        let cost = pick.cost();
        if !gap.crosses(cost) || !gap.profitable(cost) || !within_caps(state, seller_id, gap, cost) {
            continue;
        }
        let cheaper = best
            .as_ref()
            .map_or(true, |b| cost < b.cost() - MONEY_EPSILON);
        if cheaper {
            best = Some(pick);
        }
    }

    best
}

fn greedy_combination(
    input: &NormalizedInput,
    state: &PlanState,
    config: &OptimizerConfig,
    seller_id: &str,
    gap: Gap,
) -> Option<Vec<FillerPick>> {
    let mut picks: Vec<FillerPick> = Vec::new();
    let mut added = 0.0;

    for (pool_index, candidate) in input.filler_pool.iter().enumerate() {
        if picks.len() >= config.max_filler_cards_per_basket || gap.crosses(added) {
            break;
        }
        let Some(lot_index) = cheapest_lot(input, &candidate.entry.card_id, seller_id) else {
            continue;
        };
        let lot = &input.lots[lot_index];
        let available = units_left(state, candidate).min(lot.remaining);
        if available == 0 {
            continue;
        }
        let needed = ((gap.remaining(added) - MONEY_EPSILON) / lot.price).ceil().max(1.0);
        let units = (available as f64).min(needed) as u32;
        let cost = lot.price * units as f64;
        if !gap.profitable(added + cost) || !within_caps(state, seller_id, gap, added + cost) {
            continue;
        }
        added += cost;
        picks.push(FillerPick {
            pool_index,
            lot_index,
            price: lot.price,
            units,
        });
    }

    if picks.is_empty() || !gap.crosses(added) {
        return None;
    }
    Some(picks)
}

fn commit(
    input: &mut NormalizedInput,
    state: &mut PlanState,
    seller_id: &str,
    gap: Gap,
    picks: Vec<FillerPick>,
) {
    let added: f64 = picks.iter().map(FillerPick::cost).sum();

    for pick in &picks {
        let candidate = &input.filler_pool[pick.pool_index];
        let card_id = candidate.entry.card_id.clone();
        let reason = if candidate.ship_only {
            format!("SHIP_ONLY filler to reach free shipping at {:.2}", gap.free_at)
        } else {
            format!(
                "Hot-list filler (tier {}, IPS {:.2}) to reach free shipping at {:.2}",
                candidate.entry.tier, candidate.entry.ips, gap.free_at
            )
        };
        let basket = state.basket_mut(seller_id, input);
        basket.add(&card_id, pick.units, pick.price, ItemKind::HotFiller, reason);
        basket.advance(BasketStage::Packed);
        input.lots[pick.lot_index].remaining -= pick.units;
    }

    debug!(
        "[Filler] {}: +{:.2} of filler ({} card(s)) saves {:.2} shipping",
        seller_id,
        added,
        picks.len(),
        gap.base
    );
}
