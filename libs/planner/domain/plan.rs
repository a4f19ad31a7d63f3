//! Optimizer output types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Why a basket item was bought
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Demand,
    HotFiller,
    ReserveFallback,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Demand => write!(f, "DEMAND"),
            ItemKind::HotFiller => write!(f, "HOT_FILLER"),
            ItemKind::ReserveFallback => write!(f, "RESERVE_FALLBACK"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketItem {
    pub card_id: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub kind: ItemKind,
}

impl BasketItem {
    pub fn cost(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// Everything bought from one seller in one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basket {
    pub seller_id: String,
    pub marketplace: String,
    pub items: Vec<BasketItem>,
    pub subtotal: f64,
    pub shipping_cost: f64,
    pub free_shipping_triggered: bool,
    pub total_cost: f64,
    pub reasons: BTreeMap<String, Vec<String>>,
}

impl Basket {
    pub fn units_of(&self, card_id: &str) -> u32 {
        self.items
            .iter()
            .filter(|item| item.card_id == card_id)
            .map(|item| item.quantity)
            .sum()
    }

    pub fn spend_of(&self, kind: ItemKind) -> f64 {
        self.items
            .iter()
            .filter(|item| item.kind == kind)
            .map(BasketItem::cost)
            .sum()
    }

    pub fn has_kind(&self, kind: ItemKind) -> bool {
        self.items.iter().any(|item| item.kind == kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub total_baskets: usize,
    pub overall_total: f64,
    /// Demand units covered by DEMAND and RESERVE_FALLBACK items
    pub demand_satisfied: u32,
    /// Demand units after netting current inventory
    pub demand_requested: u32,
    pub shipping_total: f64,
    pub free_shipping_baskets: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetReport {
    pub total_spend: f64,
    pub demand_spend: f64,
    pub speculative_spend: f64,
    pub reserve_fallback_spend: f64,
    pub reserved_budget: f64,
    pub budget_utilization: f64,
    pub warnings: Vec<String>,
    pub hard_budget_exceeded: bool,
}

/// Reason code for demand the plan could not cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnfilledReason {
    NoOffers,
    PriceCap,
    BudgetExhausted,
    SellerCap,
}

impl UnfilledReason {
    /// Caused by a configured cap rather than missing supply
    pub fn is_cap(&self) -> bool {
        !matches!(self, UnfilledReason::NoOffers)
    }
}

impl std::fmt::Display for UnfilledReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnfilledReason::NoOffers => write!(f, "no_offers"),
            UnfilledReason::PriceCap => write!(f, "price_cap"),
            UnfilledReason::BudgetExhausted => write!(f, "budget_exhausted"),
            UnfilledReason::SellerCap => write!(f, "seller_cap"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnfilledDemand {
    pub card_id: String,
    pub quantity: u32,
    pub reason: UnfilledReason,
}

/// Purchase plan emitted by the optimizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Sorted by seller id
    pub baskets: Vec<Basket>,
    pub summary: PlanSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetReport>,
    pub unfilled_demand: Vec<UnfilledDemand>,
    /// Inputs skipped during normalization
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Plan {
    pub fn basket(&self, seller_id: &str) -> Option<&Basket> {
        self.baskets.iter().find(|b| b.seller_id == seller_id)
    }

    /// Units of a card across all baskets
    pub fn units_of(&self, card_id: &str) -> u32 {
        self.baskets.iter().map(|b| b.units_of(card_id)).sum()
    }

    pub fn items(&self) -> impl Iterator<Item = (&Basket, &BasketItem)> {
        self.baskets
            .iter()
            .flat_map(|basket| basket.items.iter().map(move |item| (basket, item)))
    }

    pub fn is_fully_satisfied(&self) -> bool {
        self.unfilled_demand.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_wire_names() {
        let json = serde_json::to_string(&UnfilledReason::BudgetExhausted).unwrap();
        assert_eq!(json, "\"budget_exhausted\"");
        let kind = serde_json::to_string(&ItemKind::ReserveFallback).unwrap();
        assert_eq!(kind, "\"RESERVE_FALLBACK\"");
    }

    #[test]
    fn test_basket_helpers() {
        let basket = Basket {
            seller_id: "s1".to_string(),
            marketplace: "MARKETPLACE".to_string(),
            items: vec![
                BasketItem { card_id: "a".into(), quantity: 2, unit_price: 1.5, kind: ItemKind::Demand },
                BasketItem { card_id: "b".into(), quantity: 1, unit_price: 4.0, kind: ItemKind::HotFiller },
            ],
            subtotal: 7.0,
            shipping_cost: 0.0,
            free_shipping_triggered: false,
            total_cost: 7.0,
            reasons: BTreeMap::new(),
        };
        assert_eq!(basket.units_of("a"), 2);
        assert!((basket.spend_of(ItemKind::Demand) - 3.0).abs() < 1e-9);
        assert!(basket.has_kind(ItemKind::HotFiller));
        assert!(!basket.has_kind(ItemKind::ReserveFallback));
    }
}
