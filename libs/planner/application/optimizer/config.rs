//! Configuration for the plan optimizer

use serde::{Deserialize, Serialize};

/// Marketplace label of the synthetic reference-fallback basket
pub const REFERENCE_MARKETPLACE: &str = "REFERENCE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Pack hot-list cards into baskets to reach free shipping.
    /// Per-call `options.allowHotListFiller` overrides this.
    pub allow_hot_list_filler: bool,

    /// Seller id used for the synthetic reference-fallback basket
    pub reference_seller_id: String,

    /// Marketplace reported for sellers whose offers carry none
    pub default_marketplace: String,

    /// Distinct filler cards a single basket may receive
    pub max_filler_cards_per_basket: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            allow_hot_list_filler: true,
            reference_seller_id: "REFERENCE".to_string(),
            default_marketplace: "MARKETPLACE".to_string(),
            max_filler_cards_per_basket: 5,
        }
    }
}

impl OptimizerConfig {
    pub fn without_filler(mut self) -> Self {
        self.allow_hot_list_filler = false;
        self
    }

    pub fn with_reference_seller_id(mut self, seller_id: impl Into<String>) -> Self {
        self.reference_seller_id = seller_id.into();
        self
    }

    pub fn with_max_filler_cards_per_basket(mut self, max: usize) -> Self {
        self.max_filler_cards_per_basket = max;
        self
    }

    pub fn problems(&self) -> Option<String> {
        if self.reference_seller_id.trim().is_empty() {
            return Some("optimizer.reference_seller_id cannot be empty".to_string());
        }
        if self.max_filler_cards_per_basket == 0 && self.allow_hot_list_filler {
            return Some(
                "optimizer.max_filler_cards_per_basket must be > 0 when filler is allowed"
                    .to_string(),
            );
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OptimizerConfig::default();
        assert!(config.allow_hot_list_filler);
        assert_eq!(config.reference_seller_id, "REFERENCE");
        assert!(config.problems().is_none());
    }

    #[test]
    fn test_builders() {
        let config = OptimizerConfig::default()
            .without_filler()
            .with_reference_seller_id("ck")
            .with_max_filler_cards_per_basket(2);
        assert!(!config.allow_hot_list_filler);
        assert_eq!(config.reference_seller_id, "ck");
        assert_eq!(config.max_filler_cards_per_basket, 2);
    }
}
