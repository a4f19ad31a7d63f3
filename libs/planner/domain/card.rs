//! Card-level inputs and outputs of the IPS calculator.

use serde::{Deserialize, Serialize};

/// Per-card metrics assembled by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardMetrics {
    pub card_id: String,
    pub card_name: String,
    /// Active decks referencing the card
    pub deck_usage_count: u32,
    /// Queued (not yet built) decks referencing the card
    pub queued_deck_usage_count: u32,
    /// Units sold per day
    pub sales_velocity: f64,
    pub low_inventory_alert_enabled: bool,
    /// Target stock level when the alert is enabled
    pub low_inventory_threshold: u32,
    pub current_inventory: u32,
    /// Reference catalog price (price ceiling)
    pub ck_price: f64,
    pub market_median_price: f64,
    /// Fraction in [0,1] of formats where the card sees play
    pub format_breadth: f64,
    /// Coefficient of variation of recent prices
    pub price_stability: f64,
}

impl CardMetrics {
    pub fn new(card_id: impl Into<String>) -> Self {
        let card_id = card_id.into();
        Self {
            card_name: card_id.clone(),
            card_id,
            ..Self::default()
        }
    }
}

/// Cards that can stand in for one another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionGroup {
    pub group_id: String,
    pub name: String,
    pub cards: Vec<String>,
}

impl SubstitutionGroup {
    /// Number of distinct cards in the group
    pub fn size(&self) -> usize {
        let mut cards: Vec<&str> = self.cards.iter().map(String::as_str).collect();
        cards.sort_unstable();
        cards.dedup();
        cards.len()
    }

    pub fn contains(&self, card_id: &str) -> bool {
        self.cards.iter().any(|c| c == card_id)
    }
}

/// Coarse procurement class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    A,
    B,
    #[default]
    C,
}

impl Tier {
    /// Tiers A and B may be used as shipping filler
    pub fn is_filler_eligible(&self) -> bool {
        matches!(self, Tier::A | Tier::B)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::A => write!(f, "A"),
            Tier::B => write!(f, "B"),
            Tier::C => write!(f, "C"),
        }
    }
}

/// One ranked card of the hot list.
///
/// Every field defaults when absent so the optimizer accepts hot lists
/// produced by other sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HotListEntry {
    pub card_id: String,
    pub card_name: String,
    #[serde(rename = "IPS")]
    pub ips: f64,
    pub tier: Tier,
    pub target_inventory: u32,
    pub current_inventory: u32,
    pub deficit: u32,
    pub demand_rate: f64,
    pub liquidity: f64,
    pub substitutability: f64,
    pub margin_safety: f64,
    pub reasons: Vec<String>,
}

impl HotListEntry {
    pub fn new(card_id: impl Into<String>, ips: f64, tier: Tier, target_inventory: u32) -> Self {
        let card_id = card_id.into();
        Self {
            card_name: card_id.clone(),
            card_id,
            ips,
            tier,
            target_inventory,
            deficit: target_inventory,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_size_ignores_duplicates() {
        let group = SubstitutionGroup {
            group_id: "g1".to_string(),
            name: "mana rocks".to_string(),
            cards: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(group.size(), 2);
        assert!(group.contains("b"));
        assert!(!group.contains("c"));
    }

    #[test]
    fn test_hot_list_entry_defaults_missing_fields() {
        let entry: HotListEntry = serde_json::from_str(r#"{"cardId":"x"}"#).unwrap();
        assert_eq!(entry.card_id, "x");
        assert_eq!(entry.ips, 0.0);
        assert_eq!(entry.tier, Tier::C);
        assert_eq!(entry.target_inventory, 0);
    }

    #[test]
    fn test_ips_field_name() {
        let entry = HotListEntry::new("x", 0.5, Tier::A, 3);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["IPS"], 0.5);
        assert_eq!(json["tier"], "A");
        assert_eq!(json["targetInventory"], 3);
    }
}
