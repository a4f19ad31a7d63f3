//! Phase 3: strict-budget trimming and plan assembly.

use tracing::debug;

use crate::domain::{
    round_cents, Basket, BudgetReport, ItemKind, Plan, PlanSummary, UnfilledDemand,
    UnfilledReason, MONEY_EPSILON,
};

use super::normalize::NormalizedInput;
use super::state::{BasketStage, PlanState};

const UTILIZATION_WARN_PCT: f64 = 80.0;
const UTILIZATION_CRITICAL_PCT: f64 = 95.0;

/// In STRICT mode, drop lowest-priority demand units until the plan fits
/// under `maxTotalSpend`.
pub(crate) fn enforce_strict_budget(input: &NormalizedInput, state: &mut PlanState) {
    let Some(budget) = state.budget.clone() else {
        return;
    };
    let Some(max_total) = budget.max_total_spend else {
        return;
    };
    if !budget.is_strict() {
        return;
    }

    while state.total_spend() > max_total + MONEY_EPSILON {
        let victim = lowest_priority_item(input, state, ItemKind::Demand)
            .or_else(|| lowest_priority_item(input, state, ItemKind::ReserveFallback));
        let Some((seller_id, index)) = victim else {
            // Only filler left
            for basket in state.baskets.values_mut() {
                basket.strip_filler();
            }
            break;
        };

        let Some(basket) = state.baskets.get_mut(&seller_id) else {
            break;
        };
        let card_id = basket.items[index].card_id.clone();
        basket.remove_unit(index);
        let below_threshold = basket
            .shipping
            .and_then(|s| s.free_at)
            .map_or(false, |free_at| basket.subtotal() < free_at - MONEY_EPSILON);
        if below_threshold && basket.items.iter().any(|i| i.kind == ItemKind::HotFiller) {
            basket.strip_filler();
        }
        state.record_unfilled(&card_id, 1, UnfilledReason::BudgetExhausted);

        debug!(
            "[Budget] Trimmed one unit of {} from {} (spend {:.2} > {:.2})",
            card_id,
            seller_id,
            state.total_spend(),
            max_total
        );
    }

    state.baskets.retain(|_, b| !b.items.is_empty());
}

/// (seller, item index) of the lowest-priority item of `kind`
fn lowest_priority_item(
    input: &NormalizedInput,
    state: &PlanState,
    kind: ItemKind,
) -> Option<(String, usize)> {
    state
        .baskets
        .values()
        .flat_map(|basket| {
            basket
                .items
                .iter()
                .enumerate()
                .filter(move |(_, item)| item.kind == kind)
                .map(move |(index, item)| (input.rank_of(&item.card_id), basket.seller_id.as_str(), index))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
        .map(|(_, seller_id, index)| (seller_id.to_string(), index))
}

/// Freeze baskets and compute summary, budget report and warnings
pub(crate) fn finalize(input: &NormalizedInput, mut state: PlanState) -> Plan {
    let unfilled_demand = state.unfilled();

    let mut baskets = Vec::with_capacity(state.baskets.len());
    for draft in state.baskets.values_mut() {
        if draft.items.is_empty() {
            continue;
        }
        draft.advance(BasketStage::Finalized);
        let subtotal = draft.subtotal();
        let free_shipping_triggered = draft
            .shipping
            .map_or(false, |s| s.is_free_at(subtotal));
        let shipping_cost = draft.shipping_cost();
        baskets.push(Basket {
            seller_id: draft.seller_id.clone(),
            marketplace: draft.marketplace.clone(),
            items: draft.items.clone(),
            subtotal,
            shipping_cost,
            free_shipping_triggered,
            total_cost: subtotal + shipping_cost,
            reasons: draft.reasons.clone(),
        });
    }

    let summary = PlanSummary {
        total_baskets: baskets.len(),
        overall_total: baskets.iter().map(|b| b.total_cost).sum(),
        demand_satisfied: baskets
            .iter()
            .flat_map(|b| b.items.iter())
            .filter(|i| i.kind != ItemKind::HotFiller)
            .map(|i| i.quantity)
            .fold(0u32, u32::saturating_add),
        demand_requested: input.demand_requested,
        shipping_total: baskets.iter().map(|b| b.shipping_cost).sum(),
        free_shipping_baskets: baskets.iter().filter(|b| b.free_shipping_triggered).count(),
    };

    let budget = build_budget_report(input, &baskets, &summary, &unfilled_demand);

    debug!(
        "[Optimizer] {} basket(s), total {:.2}, {}/{} demand unit(s) covered",
        summary.total_baskets, summary.overall_total, summary.demand_satisfied, summary.demand_requested
    );

    Plan {
        baskets,
        summary,
        budget,
        unfilled_demand,
        warnings: input.warnings.clone(),
    }
}

fn build_budget_report(
    input: &NormalizedInput,
    baskets: &[Basket],
    summary: &PlanSummary,
    unfilled: &[UnfilledDemand],
) -> Option<BudgetReport> {
    let budget = input.budget.as_ref()?;

    let spend = |kind: ItemKind| -> f64 { baskets.iter().map(|b| b.spend_of(kind)).sum() };
    let total_spend = summary.overall_total;
    let (utilization, hard_budget_exceeded) = match budget.max_total_spend {
        Some(max_total) if max_total > MONEY_EPSILON => (
            100.0 * total_spend / max_total,
            total_spend > max_total + MONEY_EPSILON,
        ),
        Some(max_total) => (0.0, total_spend > max_total + MONEY_EPSILON),
        None => (0.0, false),
    };

    // Thresholds compare the raw ratio; only the reported figure is rounded
    let budget_utilization = round_cents(utilization);

    let mut warnings = Vec::new();
    if utilization >= UTILIZATION_WARN_PCT {
        warnings.push(format!(
            "Budget utilization at {:.1}% (>= {:.0}%)",
            budget_utilization, UTILIZATION_WARN_PCT
        ));
    }
    if utilization >= UTILIZATION_CRITICAL_PCT {
        warnings.push(format!(
            "Budget utilization at {:.1}% (>= {:.0}%)",
            budget_utilization, UTILIZATION_CRITICAL_PCT
        ));
    }
    if hard_budget_exceeded {
        warnings.push(format!(
            "Hard budget exceeded: {:.2} spent against a cap of {:.2}",
            total_spend,
            budget.max_total_spend.unwrap_or(0.0)
        ));
    }
    for entry in unfilled.iter().filter(|u| u.reason.is_cap()) {
        warnings.push(format!(
            "{} unit(s) of {} unfilled: {}",
            entry.quantity, entry.card_id, entry.reason
        ));
    }
    if !budget.is_strict() {
        if let Some(max_seller) = budget.max_per_seller {
            for basket in baskets.iter().filter(|b| b.subtotal > max_seller + MONEY_EPSILON) {
                warnings.push(format!(
                    "Seller {} subtotal {:.2} exceeds maxPerSeller {:.2}",
                    basket.seller_id, basket.subtotal, max_seller
                ));
            }
        }
    }

    Some(BudgetReport {
        total_spend,
        demand_spend: spend(ItemKind::Demand),
        speculative_spend: spend(ItemKind::HotFiller),
        reserve_fallback_spend: spend(ItemKind::ReserveFallback),
        reserved_budget: budget.reserved(),
        budget_utilization,
        warnings,
        hard_budget_exceeded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::optimizer::components::normalize::normalize;
    use crate::application::optimizer::config::OptimizerConfig;
    use crate::application::optimizer::input::PlannerInput;
    use crate::domain::{Budget, Demand, Offer, Shipping};

    fn prepare(input: &PlannerInput) -> (NormalizedInput, PlanState) {
        let norm = normalize(input, &OptimizerConfig::default());
        let state = PlanState::new(norm.budget.clone());
        (norm, state)
    }

    #[test]
    fn test_finalize_shipping_identity() {
        let input = PlannerInput::new()
            .with_demands(vec![Demand::new("c1", 1)])
            .with_offers(vec![Offer::new("c1", "s1", 4.0, 1).with_shipping(Shipping::new(3.0, 10.0))]);
        let (norm, mut state) = prepare(&input);
        state.basket_mut("s1", &norm).add("c1", 1, 4.0, ItemKind::Demand, "r".into());

        let plan = finalize(&norm, state);
        let basket = &plan.baskets[0];
        assert_eq!(basket.shipping_cost, 3.0);
        assert!(!basket.free_shipping_triggered);
        assert!((basket.total_cost - 7.0).abs() < 1e-9);
        assert_eq!(plan.summary.shipping_total, 3.0);
        assert!(plan.budget.is_none());
    }

    #[test]
    fn test_strict_trim_drops_lowest_priority() {
        let input = PlannerInput::new()
            .with_demands(vec![Demand::new("a", 1), Demand::new("b", 1)])
            .with_budget(Budget::strict(6.0));
        let (norm, mut state) = prepare(&input);
        state.basket_mut("s1", &norm).add("a", 1, 4.0, ItemKind::Demand, "r".into());
        state.basket_mut("s2", &norm).add("b", 1, 4.0, ItemKind::Demand, "r".into());

        enforce_strict_budget(&norm, &mut state);
        // equal IPS: card id order puts b last
        assert!(!state.baskets.contains_key("s2"));
        let unfilled = state.unfilled();
        assert_eq!(unfilled[0].card_id, "b");
        assert_eq!(unfilled[0].reason, UnfilledReason::BudgetExhausted);
    }

    #[test]
    fn test_utilization_warnings() {
        let input = PlannerInput::new()
            .with_demands(vec![Demand::new("a", 1)])
            .with_budget(Budget::strict(10.0));
        let (norm, mut state) = prepare(&input);
        state.basket_mut("s1", &norm).add("a", 1, 9.6, ItemKind::Demand, "r".into());

        let plan = finalize(&norm, state);
        let report = plan.budget.expect("budget report");
        assert_eq!(report.budget_utilization, 96.0);
        assert_eq!(report.warnings.len(), 2);
        assert!(!report.hard_budget_exceeded);
    }

    #[test]
    fn test_utilization_just_below_threshold_stays_quiet() {
        let input = PlannerInput::new()
            .with_demands(vec![Demand::new("a", 1)])
            .with_budget(Budget::strict(10_000.0));
        let (norm, mut state) = prepare(&input);
        state.basket_mut("s1", &norm).add("a", 1, 7999.6, ItemKind::Demand, "r".into());

        let plan = finalize(&norm, state);
        let report = plan.budget.expect("budget report");
        // 79.996% reports as 80.0 but has not reached the threshold
        assert_eq!(report.budget_utilization, 80.0);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_demand_satisfied_saturates() {
        let input = PlannerInput::new().with_demands(vec![Demand::new("a", 1)]);
        let (norm, mut state) = prepare(&input);
        state.basket_mut("s1", &norm).add("a", u32::MAX, 0.0, ItemKind::Demand, "r".into());
        state.basket_mut("s2", &norm).add("b", 5, 0.0, ItemKind::Demand, "r".into());

        let plan = finalize(&norm, state);
        assert_eq!(plan.summary.demand_satisfied, u32::MAX);
    }

    #[test]
    fn test_soft_overshoot_flags_and_warns() {
        let budget = Budget {
            max_per_seller: Some(5.0),
            ..Budget::soft(8.0)
        };
        let input = PlannerInput::new()
            .with_demands(vec![Demand::new("a", 2)])
            .with_budget(budget);
        let (norm, mut state) = prepare(&input);
        state.basket_mut("s1", &norm).add("a", 2, 5.0, ItemKind::Demand, "r".into());

        let plan = finalize(&norm, state);
        let report = plan.budget.expect("budget report");
        assert!(report.hard_budget_exceeded);
        assert!(report.warnings.iter().any(|w| w.contains("Hard budget exceeded")));
        assert!(report.warnings.iter().any(|w| w.contains("maxPerSeller")));
    }

    #[test]
    fn test_reserved_budget_reported() {
        let budget = Budget {
            reserve_budget_percent: Some(20.0),
            ..Budget::strict(50.0)
        };
        let input = PlannerInput::new().with_budget(budget);
        let (norm, state) = prepare(&input);
        let plan = finalize(&norm, state);
        assert_eq!(plan.budget.expect("budget report").reserved_budget, 10.0);
        assert!(plan.baskets.is_empty());
    }
}
