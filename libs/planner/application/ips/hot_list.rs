//! Hot list construction and filtering.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{CardMetrics, HotListEntry, SubstitutionGroup};

use super::config::IpsConfig;
use super::scoring::calculate_card_ips;

/// Request accepted by [`compute_hot_list`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HotListRequest {
    pub cards: Vec<CardMetrics>,
    #[serde(default)]
    pub groups: Vec<SubstitutionGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<IpsConfig>,
}

/// IPS descending, then deficit descending, then card id ascending.
pub fn hot_list_order(a: &HotListEntry, b: &HotListEntry) -> Ordering {
    b.ips
        .total_cmp(&a.ips)
        .then_with(|| b.deficit.cmp(&a.deficit))
        .then_with(|| a.card_id.cmp(&b.card_id))
}

/// Score every card and rank the result.
pub fn generate_hot_list(
    cards: &[CardMetrics],
    groups: &[SubstitutionGroup],
    config: &IpsConfig,
) -> Vec<HotListEntry> {
    let mut entries: Vec<HotListEntry> = cards
        .iter()
        .map(|card| calculate_card_ips(card, groups, config))
        .collect();
    entries.sort_by(hot_list_order);

    debug!(
        "[IPS] Ranked {} cards ({} with positive IPS)",
        entries.len(),
        entries.iter().filter(|e| e.ips > 0.0).count()
    );
    entries
}

/// Drop entries with zero IPS.
pub fn filter_eligible_hot_list(hot_list: &[HotListEntry]) -> Vec<HotListEntry> {
    hot_list.iter().filter(|e| e.ips > 0.0).cloned().collect()
}

/// Tier A and B entries, in their original order.
pub fn get_shipping_filler_candidates(hot_list: &[HotListEntry]) -> Vec<HotListEntry> {
    hot_list
        .iter()
        .filter(|e| e.tier.is_filler_eligible())
        .cloned()
        .collect()
}

/// Entry point: score a batch of cards with optional groups and config.
pub fn compute_hot_list(request: &HotListRequest) -> Vec<HotListEntry> {
    let default_config = IpsConfig::default();
    let config = request.config.as_ref().unwrap_or(&default_config);
    generate_hot_list(&request.cards, &request.groups, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tier;

    fn card(id: &str, decks: u32, inventory: u32) -> CardMetrics {
        CardMetrics {
            deck_usage_count: decks,
            current_inventory: inventory,
            ..CardMetrics::new(id)
        }
    }

    #[test]
    fn test_high_demand_ranks_first() {
        let list = generate_hot_list(
            &[card("low", 1, 10), card("high", 10, 0)],
            &[],
            &IpsConfig::default(),
        );
        assert_eq!(list[0].card_id, "high");
        assert_eq!(list[1].card_id, "low");
    }

    #[test]
    fn test_ties_break_on_card_id() {
        let list = generate_hot_list(
            &[card("b", 0, 5), card("a", 0, 5)],
            &[],
            &IpsConfig::default(),
        );
        assert_eq!(list[0].card_id, "a");
    }

    #[test]
    fn test_ips_descending() {
        let cards: Vec<CardMetrics> = (0..8)
            .map(|i| CardMetrics {
                deck_usage_count: i,
                sales_velocity: 0.1 * i as f64,
                ck_price: 10.0,
                market_median_price: 6.0,
                ..CardMetrics::new(format!("card-{}", i))
            })
            .collect();
        let list = generate_hot_list(&cards, &[], &IpsConfig::default());
        for pair in list.windows(2) {
            assert!(pair[0].ips >= pair[1].ips);
        }
    }

    #[test]
    fn test_filters() {
        let list = vec![
            HotListEntry::new("a", 0.9, Tier::A, 3),
            HotListEntry::new("b", 0.0, Tier::B, 1),
            HotListEntry::new("c", 0.3, Tier::C, 1),
            HotListEntry::new("d", 0.5, Tier::B, 2),
        ];
        let eligible: Vec<_> = filter_eligible_hot_list(&list).into_iter().map(|e| e.card_id).collect();
        assert_eq!(eligible, vec!["a", "c", "d"]);

        let filler: Vec<_> = get_shipping_filler_candidates(&list).into_iter().map(|e| e.card_id).collect();
        assert_eq!(filler, vec!["a", "b", "d"]);
    }

    #[test]
    fn test_request_rejects_unknown_keys() {
        let ok: Result<HotListRequest, _> = serde_json::from_str(r#"{"cards":[]}"#);
        assert!(ok.is_ok());
        let bad: Result<HotListRequest, _> = serde_json::from_str(r#"{"cards":[],"extra":1}"#);
        assert!(bad.is_err());
    }
}
