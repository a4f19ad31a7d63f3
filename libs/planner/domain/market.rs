//! Marketplace inputs: what to buy, what is on offer, and the spending caps.

use serde::{Deserialize, Serialize};

/// Units of a card the caller needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demand {
    pub card_id: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
}

impl Demand {
    pub fn new(card_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            card_id: card_id.into(),
            quantity,
            max_price: None,
        }
    }

    pub fn with_max_price(mut self, max_price: f64) -> Self {
        self.max_price = Some(max_price);
        self
    }
}

/// How a directive changes the treatment of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectiveMode {
    /// Hard demand; bypasses the demand's max price (never max per card)
    Force,
    /// Wins ties against equal-IPS demands
    Prefer,
    /// Only ever bought as shipping filler
    ShipOnly,
}

impl std::fmt::Display for DirectiveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectiveMode::Force => write!(f, "FORCE"),
            DirectiveMode::Prefer => write!(f, "PREFER"),
            DirectiveMode::ShipOnly => write!(f, "SHIP_ONLY"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Directive {
    pub card_id: String,
    pub mode: DirectiveMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl Directive {
    pub fn new(card_id: impl Into<String>, mode: DirectiveMode) -> Self {
        Self {
            card_id: card_id.into(),
            mode,
            quantity: None,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

/// Per-basket shipping rule of a seller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipping {
    /// Flat shipping cost for the basket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<f64>,
    /// Basket subtotal at which shipping becomes free
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_at: Option<f64>,
}

impl Shipping {
    pub fn new(base: f64, free_at: f64) -> Self {
        Self {
            base: Some(base),
            free_at: Some(free_at),
        }
    }

    pub fn flat(base: f64) -> Self {
        Self {
            base: Some(base),
            free_at: None,
        }
    }

    pub fn base_cost(&self) -> f64 {
        self.base.unwrap_or(0.0)
    }

    pub fn is_free_at(&self, subtotal: f64) -> bool {
        match self.free_at {
            Some(threshold) => subtotal >= threshold - super::MONEY_EPSILON,
            None => false,
        }
    }

    /// Shipping charged for a basket with this subtotal
    pub fn cost_for(&self, subtotal: f64) -> f64 {
        if self.is_free_at(subtotal) {
            0.0
        } else {
            self.base_cost()
        }
    }
}

/// A live listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub card_id: String,
    pub seller_id: String,
    pub price: f64,
    pub quantity_available: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<Shipping>,
}

impl Offer {
    pub fn new(
        card_id: impl Into<String>,
        seller_id: impl Into<String>,
        price: f64,
        quantity_available: u32,
    ) -> Self {
        Self {
            card_id: card_id.into(),
            seller_id: seller_id.into(),
            price,
            quantity_available,
            marketplace: None,
            shipping: None,
        }
    }

    pub fn with_shipping(mut self, shipping: Shipping) -> Self {
        self.shipping = Some(shipping);
        self
    }

    pub fn with_marketplace(mut self, marketplace: impl Into<String>) -> Self {
        self.marketplace = Some(marketplace.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetMode {
    /// Never cross the total cap
    #[default]
    Strict,
    /// Demand items may overshoot; everything else respects the caps
    Soft,
}

/// Resolved numeric spending caps. Absent caps are unlimited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Budget {
    pub max_total_spend: Option<f64>,
    pub max_per_seller: Option<f64>,
    pub max_per_card: Option<f64>,
    pub max_speculative_spend: Option<f64>,
    pub reserve_budget_percent: Option<f64>,
    pub budget_mode: BudgetMode,
}

impl Budget {
    pub fn strict(max_total_spend: f64) -> Self {
        Self {
            max_total_spend: Some(max_total_spend),
            ..Self::default()
        }
    }

    pub fn soft(max_total_spend: f64) -> Self {
        Self {
            max_total_spend: Some(max_total_spend),
            budget_mode: BudgetMode::Soft,
            ..Self::default()
        }
    }

    pub fn is_strict(&self) -> bool {
        self.budget_mode == BudgetMode::Strict
    }

    /// `maxTotalSpend * reserveBudgetPercent / 100`, zero when either is unset
    pub fn reserved(&self) -> f64 {
        match (self.max_total_spend, self.reserve_budget_percent) {
            (Some(total), Some(pct)) => total * pct.clamp(0.0, 100.0) / 100.0,
            _ => 0.0,
        }
    }

    /// Part of the total cap usable by anything but reference fallback
    pub fn spendable_outside_reserve(&self) -> Option<f64> {
        self.max_total_spend.map(|total| (total - self.reserved()).max(0.0))
    }
}
