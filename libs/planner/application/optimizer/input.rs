//! Raw input accepted by the optimizer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Budget, Demand, Directive, HotListEntry, Offer};

/// Per-call switches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlannerOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_hot_list_filler: Option<bool>,
}

/// Complete optimizer input.
///
/// Unknown top-level keys are rejected when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlannerInput {
    #[serde(default)]
    pub demands: Vec<Demand>,
    #[serde(default)]
    pub directives: Vec<Directive>,
    #[serde(default)]
    pub offers: Vec<Offer>,
    #[serde(default)]
    pub hot_list: Vec<HotListEntry>,
    /// Reference (ceiling / fallback) price per card
    #[serde(default)]
    pub card_kingdom_prices: BTreeMap<String, f64>,
    /// Units on hand per card
    #[serde(default)]
    pub current_inventory: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<PlannerOptions>,
}

impl PlannerInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_demands(mut self, demands: Vec<Demand>) -> Self {
        self.demands = demands;
        self
    }

    pub fn with_offers(mut self, offers: Vec<Offer>) -> Self {
        self.offers = offers;
        self
    }

    pub fn with_directives(mut self, directives: Vec<Directive>) -> Self {
        self.directives = directives;
        self
    }

    pub fn with_hot_list(mut self, hot_list: Vec<HotListEntry>) -> Self {
        self.hot_list = hot_list;
        self
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_reference_price(mut self, card_id: impl Into<String>, price: f64) -> Self {
        self.card_kingdom_prices.insert(card_id.into(), price);
        self
    }

    pub fn with_inventory(mut self, card_id: impl Into<String>, units: u32) -> Self {
        self.current_inventory.insert(card_id.into(), units);
        self
    }

    pub fn with_hot_list_filler(mut self, allow: bool) -> Self {
        self.options = Some(PlannerOptions {
            allow_hot_list_filler: Some(allow),
        });
        self
    }

    /// Per-call override, falling back to the configured default
    pub fn allow_hot_list_filler(&self, default: bool) -> bool {
        self.options
            .as_ref()
            .and_then(|o| o.allow_hot_list_filler)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_format() {
        let json = r#"{
            "demands": [{"cardId": "c1", "quantity": 2, "maxPrice": 5.0}],
            "directives": [{"cardId": "c1", "mode": "FORCE"}],
            "offers": [{"cardId": "c1", "sellerId": "s1", "price": 3.0, "quantityAvailable": 4,
                        "shipping": {"base": 1.5, "freeAt": 20.0}}],
            "hotList": [{"cardId": "c2", "IPS": 0.9, "tier": "A", "targetInventory": 2}],
            "cardKingdomPrices": {"c1": 4.5},
            "currentInventory": {"c1": 1},
            "budget": {"maxTotalSpend": 100, "budgetMode": "STRICT"}
        }"#;
        let input: PlannerInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.demands[0].max_price, Some(5.0));
        assert_eq!(input.offers[0].shipping.unwrap().free_at, Some(20.0));
        assert_eq!(input.hot_list[0].ips, 0.9);
        assert_eq!(input.current_inventory["c1"], 1);
        assert!(input.allow_hot_list_filler(true));
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        let result: Result<PlannerInput, _> = serde_json::from_str(r#"{"demands": [], "bogus": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_filler_override() {
        let input = PlannerInput::new().with_hot_list_filler(false);
        assert!(!input.allow_hot_list_filler(true));
        assert!(PlannerInput::new().allow_hot_list_filler(true));
    }
}
