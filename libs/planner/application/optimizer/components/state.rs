//! Mutable working state of one optimizer run.
//!
//! Baskets move strictly forward through their lifecycle:
//! `Empty -> Accumulating -> Packed -> Finalized`.

use std::collections::BTreeMap;

use crate::application::optimizer::config::REFERENCE_MARKETPLACE;
use crate::domain::{
    BasketItem, Budget, ItemKind, Shipping, UnfilledDemand, UnfilledReason, MONEY_EPSILON,
};

use super::normalize::NormalizedInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum BasketStage {
    Empty,
    Accumulating,
    Packed,
    Finalized,
}

#[derive(Debug, Clone)]
pub(crate) struct BasketDraft {
    pub seller_id: String,
    pub marketplace: String,
    pub shipping: Option<Shipping>,
    pub is_reference: bool,
    pub items: Vec<BasketItem>,
    pub reasons: BTreeMap<String, Vec<String>>,
    pub stage: BasketStage,
}

impl BasketDraft {
    fn new(seller_id: &str, marketplace: &str, shipping: Option<Shipping>, is_reference: bool) -> Self {
        Self {
            seller_id: seller_id.to_string(),
            marketplace: marketplace.to_string(),
            shipping,
            is_reference,
            items: Vec::new(),
            reasons: BTreeMap::new(),
            stage: BasketStage::Empty,
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(BasketItem::cost).sum()
    }

    pub fn shipping_cost(&self) -> f64 {
        if self.items.is_empty() {
            return 0.0;
        }
        shipping_for(self.shipping.as_ref(), self.subtotal())
    }

    pub fn spend_of(&self, kind: ItemKind) -> f64 {
        self.items
            .iter()
            .filter(|i| i.kind == kind)
            .map(BasketItem::cost)
            .sum()
    }

    /// Move forward in the lifecycle; never backwards
    pub fn advance(&mut self, stage: BasketStage) {
        if stage > self.stage {
            self.stage = stage;
        }
    }

    /// Add units, coalescing with an existing item of the same card, price and kind
    pub fn add(&mut self, card_id: &str, quantity: u32, unit_price: f64, kind: ItemKind, reason: String) {
        if quantity == 0 {
            return;
        }
        let existing = self.items.iter_mut().find(|i| {
            i.card_id == card_id && i.kind == kind && (i.unit_price - unit_price).abs() < MONEY_EPSILON
        });
        match existing {
            Some(item) => item.quantity += quantity,
            None => self.items.push(BasketItem {
                card_id: card_id.to_string(),
                quantity,
                unit_price,
                kind,
            }),
        }
        let reasons = self.reasons.entry(card_id.to_string()).or_default();
        if !reasons.contains(&reason) {
            reasons.push(reason);
        }
    }

    /// Remove one unit of the given item; drops the item when it reaches zero
    pub fn remove_unit(&mut self, index: usize) {
        let Some(item) = self.items.get_mut(index) else {
            return;
        };
        item.quantity = item.quantity.saturating_sub(1);
        if item.quantity == 0 {
            let card_id = self.items.remove(index).card_id;
            if !self.items.iter().any(|i| i.card_id == card_id) {
                self.reasons.remove(&card_id);
            }
        }
    }

    /// Remove every filler item, returning the spend released
    pub fn strip_filler(&mut self) -> f64 {
        let released = self.spend_of(ItemKind::HotFiller);
        let removed: Vec<String> = self
            .items
            .iter()
            .filter(|i| i.kind == ItemKind::HotFiller)
            .map(|i| i.card_id.clone())
            .collect();
        self.items.retain(|i| i.kind != ItemKind::HotFiller);
        for card_id in removed {
            if !self.items.iter().any(|i| i.card_id == card_id) {
                self.reasons.remove(&card_id);
            }
        }
        released
    }
}

/// Shipping charged for a subtotal under an optional rule
pub(crate) fn shipping_for(shipping: Option<&Shipping>, subtotal: f64) -> f64 {
    shipping.map_or(0.0, |s| s.cost_for(subtotal))
}

#[derive(Debug, Clone)]
pub(crate) struct PlanState {
    pub baskets: BTreeMap<String, BasketDraft>,
    pub budget: Option<Budget>,
    unfilled: BTreeMap<(String, UnfilledReason), u32>,
}

impl PlanState {
    pub fn new(budget: Option<Budget>) -> Self {
        Self {
            baskets: BTreeMap::new(),
            budget,
            unfilled: BTreeMap::new(),
        }
    }

    /// Basket for a seller, opened on first use
    pub fn basket_mut(&mut self, seller_id: &str, input: &NormalizedInput) -> &mut BasketDraft {
        let is_reference = seller_id == input.reference_seller_id;
        self.baskets.entry(seller_id.to_string()).or_insert_with(|| {
            if is_reference {
                BasketDraft::new(seller_id, REFERENCE_MARKETPLACE, None, true)
            } else {
                let profile = input.sellers.get(seller_id);
                BasketDraft::new(
                    seller_id,
                    profile.map_or("", |p| p.marketplace.as_str()),
                    profile.and_then(|p| p.shipping),
                    false,
                )
            }
        })
    }

    pub fn subtotal_of(&self, seller_id: &str) -> f64 {
        self.baskets.get(seller_id).map_or(0.0, BasketDraft::subtotal)
    }

    pub fn shipping_of(&self, seller_id: &str) -> f64 {
        self.baskets.get(seller_id).map_or(0.0, BasketDraft::shipping_cost)
    }

    /// Items plus shipping of every basket
    pub fn total_spend(&self) -> f64 {
        self.baskets
            .values()
            .map(|b| b.subtotal() + b.shipping_cost())
            .sum()
    }

    pub fn spend_of(&self, kind: ItemKind) -> f64 {
        self.baskets.values().map(|b| b.spend_of(kind)).sum()
    }

    /// Everything except reference-fallback items
    pub fn non_fallback_spend(&self) -> f64 {
        self.total_spend() - self.spend_of(ItemKind::ReserveFallback)
    }

    /// Units of a card bought under the given kind
    pub fn units_of(&self, card_id: &str, kind: ItemKind) -> u32 {
        self.baskets
            .values()
            .flat_map(|b| b.items.iter())
            .filter(|i| i.card_id == card_id && i.kind == kind)
            .map(|i| i.quantity)
            .sum()
    }

    /// Whether non-fallback spend may change by `delta` without breaking
    /// the total cap or eating into the reserve
    pub fn non_fallback_fits(&self, delta: f64) -> bool {
        let Some(budget) = &self.budget else {
            return true;
        };
        let Some(max_total) = budget.max_total_spend else {
            return true;
        };
        let outside_reserve = budget.spendable_outside_reserve().unwrap_or(max_total);
        let projected_non_fallback = self.non_fallback_spend() + delta;
        let projected_total = self.total_spend() + delta;
        projected_non_fallback <= outside_reserve + MONEY_EPSILON
            && projected_total <= max_total + MONEY_EPSILON
    }

    pub fn record_unfilled(&mut self, card_id: &str, quantity: u32, reason: UnfilledReason) {
        if quantity == 0 {
            return;
        }
        *self
            .unfilled
            .entry((card_id.to_string(), reason))
            .or_insert(0) += quantity;
    }

    /// Unfilled demand sorted by card id, then reason
    pub fn unfilled(&self) -> Vec<UnfilledDemand> {
        self.unfilled
            .iter()
            .map(|((card_id, reason), quantity)| UnfilledDemand {
                card_id: card_id.clone(),
                quantity: *quantity,
                reason: *reason,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(shipping: Option<Shipping>) -> BasketDraft {
        BasketDraft::new("s1", "MARKETPLACE", shipping, false)
    }

    #[test]
    fn test_add_coalesces() {
        let mut basket = draft(None);
        basket.add("a", 1, 2.0, ItemKind::Demand, "r".into());
        basket.add("a", 2, 2.0, ItemKind::Demand, "r".into());
        basket.add("a", 1, 2.0, ItemKind::HotFiller, "f".into());
        assert_eq!(basket.items.len(), 2);
        assert_eq!(basket.items[0].quantity, 3);
        assert_eq!(basket.reasons["a"], vec!["r".to_string(), "f".to_string()]);
        assert!((basket.subtotal() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_stage_only_moves_forward() {
        let mut basket = draft(None);
        basket.advance(BasketStage::Packed);
        basket.advance(BasketStage::Accumulating);
        assert_eq!(basket.stage, BasketStage::Packed);
    }

    #[test]
    fn test_shipping_cost_for_empty_basket_is_zero() {
        let basket = draft(Some(Shipping::new(3.0, 10.0)));
        assert_eq!(basket.shipping_cost(), 0.0);
    }

    #[test]
    fn test_remove_unit_and_strip_filler() {
        let mut basket = draft(Some(Shipping::new(3.0, 10.0)));
        basket.add("a", 1, 5.0, ItemKind::Demand, "r".into());
        basket.add("b", 1, 5.0, ItemKind::HotFiller, "f".into());
        assert_eq!(basket.shipping_cost(), 0.0);
        assert!((basket.strip_filler() - 5.0).abs() < 1e-9);
        assert_eq!(basket.shipping_cost(), 3.0);
        assert!(!basket.reasons.contains_key("b"));
        basket.remove_unit(0);
        assert!(basket.items.is_empty());
    }

    #[test]
    fn test_unfilled_merges_per_reason() {
        let mut state = PlanState::new(None);
        state.record_unfilled("a", 1, UnfilledReason::BudgetExhausted);
        state.record_unfilled("a", 2, UnfilledReason::BudgetExhausted);
        state.record_unfilled("a", 0, UnfilledReason::NoOffers);
        let unfilled = state.unfilled();
        assert_eq!(unfilled.len(), 1);
        assert_eq!(unfilled[0].quantity, 3);
    }

    #[test]
    fn test_non_fallback_fits_respects_reserve() {
        let budget = Budget {
            max_total_spend: Some(100.0),
            reserve_budget_percent: Some(20.0),
            ..Budget::default()
        };
        let state = PlanState::new(Some(budget));
        assert!(state.non_fallback_fits(80.0));
        assert!(!state.non_fallback_fits(80.01));
    }
}
