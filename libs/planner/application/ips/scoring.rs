//! Per-card scoring.
//!
//! IPS = (demand_rate / 10) * liquidity * substitutability * margin_safety
//!
//! Every component is bounded, so IPS stays in [0,1] under the default caps.
//! Non-finite or negative metrics are read as zero.

use tracing::debug;

use crate::domain::{sanitize, CardMetrics, HotListEntry, SubstitutionGroup, Tier};

use super::config::IpsConfig;

/// Weighted, capped demand signal in [0, 10] under default caps.
pub fn calculate_demand_rate(card: &CardMetrics, config: &IpsConfig) -> f64 {
    let w = &config.weights;
    let caps = &config.caps;

    let deck = normalize(card.deck_usage_count as f64, caps.deck);
    let queued = normalize(card.queued_deck_usage_count as f64, caps.queued);
    let velocity = normalize(sanitize(card.sales_velocity) * config.velocity_scale, caps.velocity);
    let alert = if card.low_inventory_alert_enabled {
        normalize(config.alert_bump, caps.alert)
    } else {
        0.0
    };

    w.deck * deck + w.queued * queued + w.velocity * velocity + w.alert * alert
}

/// Saturating transform of sales velocity: `v / (v + k)`.
///
/// Strictly increasing in velocity and always in [0, 1).
pub fn calculate_liquidity(card: &CardMetrics, config: &IpsConfig) -> f64 {
    let velocity = sanitize(card.sales_velocity);
    let k = config.liquidity_half_saturation;
    if velocity == 0.0 || k <= 0.0 {
        return if velocity > 0.0 { 1.0 } else { 0.0 };
    }
    (velocity / (velocity + k)).clamp(0.0, 1.0)
}

/// Substitutability within a group of `size` distinct cards.
///
/// `1 / sqrt(size)`, floored. A group of one is no substitute at all.
pub fn group_substitutability(size: usize, floor: f64) -> f64 {
    if size <= 1 {
        return 1.0;
    }
    (1.0 / (size as f64).sqrt()).max(floor).min(1.0)
}

/// The group yielding the lowest substitutability for this card, if any.
pub fn tightest_group<'a>(
    card_id: &str,
    groups: &'a [SubstitutionGroup],
    config: &IpsConfig,
) -> Option<(&'a SubstitutionGroup, f64)> {
    groups
        .iter()
        .filter(|g| g.contains(card_id))
        .map(|g| (g, group_substitutability(g.size(), config.substitutability_floor)))
        .min_by(|(ga, a), (gb, b)| a.total_cmp(b).then_with(|| ga.group_id.cmp(&gb.group_id)))
}

/// 1.0 outside any group, otherwise decreasing with group size down to the floor.
pub fn calculate_substitutability(
    card: &CardMetrics,
    groups: &[SubstitutionGroup],
    config: &IpsConfig,
) -> f64 {
    tightest_group(&card.card_id, groups, config)
        .map(|(_, value)| value)
        .unwrap_or(1.0)
}

/// How far the market median sits below the reference price, as a fraction.
pub fn calculate_margin_safety(card: &CardMetrics) -> f64 {
    let ck_price = sanitize(card.ck_price);
    if ck_price <= 0.0 {
        return 0.0;
    }
    let median = sanitize(card.market_median_price);
    ((ck_price - median) / ck_price).clamp(0.0, 1.0)
}

/// Stock to hold for a given demand rate; never below one unit.
pub fn calculate_target_inventory(demand_rate: f64, config: &IpsConfig) -> u32 {
    let scaled = (sanitize(demand_rate) * config.target_inventory_scale).ceil();
    (scaled.min(u32::MAX as f64) as u32).max(1)
}

pub fn determine_tier(ips: f64, liquidity: f64, margin_safety: f64, config: &IpsConfig) -> Tier {
    if margin_safety < config.min_margin || liquidity < config.min_liquidity {
        return Tier::C;
    }
    if ips >= config.tier_a {
        Tier::A
    } else if ips >= config.tier_b {
        Tier::B
    } else {
        Tier::C
    }
}

/// Score one card and build its hot-list entry.
pub fn calculate_card_ips(
    card: &CardMetrics,
    groups: &[SubstitutionGroup],
    config: &IpsConfig,
) -> HotListEntry {
    let demand_rate = calculate_demand_rate(card, config);
    let liquidity = calculate_liquidity(card, config);
    let group = tightest_group(&card.card_id, groups, config);
    let substitutability = group.map(|(_, value)| value).unwrap_or(1.0);
    let margin_safety = calculate_margin_safety(card);

    let normalized = demand_rate / config.demand_normalizer;
    let ips = sanitize(normalized * liquidity * substitutability * margin_safety);
    let tier = determine_tier(ips, liquidity, margin_safety, config);

    let mut target_inventory = calculate_target_inventory(demand_rate, config);
    if card.low_inventory_alert_enabled {
        target_inventory = target_inventory.max(card.low_inventory_threshold);
    }
    let deficit = target_inventory.saturating_sub(card.current_inventory);

    let mut reasons = Vec::new();
    if card.deck_usage_count > 0 {
        reasons.push(format!(
            "Used in {} active deck{}",
            card.deck_usage_count,
            plural(card.deck_usage_count)
        ));
    }
    if card.queued_deck_usage_count > 0 {
        reasons.push(format!(
            "Queued for {} upcoming deck{}",
            card.queued_deck_usage_count,
            plural(card.queued_deck_usage_count)
        ));
    }
    if sanitize(card.sales_velocity) > 0.0 {
        reasons.push(format!("Sells {:.2} units/day", card.sales_velocity));
    }
    if card.low_inventory_alert_enabled {
        reasons.push(format!(
            "Low inventory alert enabled (threshold {})",
            card.low_inventory_threshold
        ));
    }
    if let Some((g, value)) = group {
        if value < 1.0 {
            reasons.push(format!(
                "Substitutable within '{}' ({} cards)",
                g.name,
                g.size()
            ));
        }
    }
    if margin_safety < config.min_margin {
        reasons.push(format!(
            "Thin margin: market median {:.2} vs reference {:.2}",
            card.market_median_price, card.ck_price
        ));
    } else {
        reasons.push(format!("Margin safety {:.0}%", margin_safety * 100.0));
    }
    if deficit > 0 {
        reasons.push(format!(
            "Below target: {} on hand, target {}",
            card.current_inventory, target_inventory
        ));
    }

    debug!(
        "[IPS] {}: demand={:.2} liq={:.3} subs={:.3} margin={:.3} -> ips={:.4} tier={}",
        card.card_id, demand_rate, liquidity, substitutability, margin_safety, ips, tier
    );

    HotListEntry {
        card_id: card.card_id.clone(),
        card_name: card.card_name.clone(),
        ips,
        tier,
        target_inventory,
        current_inventory: card.current_inventory,
        deficit,
        demand_rate,
        liquidity,
        substitutability,
        margin_safety,
        reasons,
    }
}

fn normalize(value: f64, cap: f64) -> f64 {
    sanitize(value).min(cap.max(0.0))
}

fn plural(n: u32) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sol_ring() -> CardMetrics {
        CardMetrics {
            card_id: "sol-ring".to_string(),
            card_name: "Sol Ring".to_string(),
            deck_usage_count: 5,
            queued_deck_usage_count: 2,
            sales_velocity: 0.5,
            low_inventory_alert_enabled: true,
            low_inventory_threshold: 4,
            current_inventory: 1,
            ck_price: 4.00,
            market_median_price: 3.00,
            format_breadth: 0.8,
            price_stability: 0.1,
        }
    }

    fn group(id: &str, cards: &[&str]) -> SubstitutionGroup {
        SubstitutionGroup {
            group_id: id.to_string(),
            name: id.to_string(),
            cards: cards.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_demand_rate_baseline() {
        let rate = calculate_demand_rate(&sol_ring(), &IpsConfig::default());
        assert!((rate - 4.6).abs() < 1e-9, "got {}", rate);
    }

    #[test]
    fn test_demand_rate_capped() {
        let card = CardMetrics {
            deck_usage_count: 500,
            queued_deck_usage_count: 500,
            sales_velocity: 90.0,
            low_inventory_alert_enabled: true,
            ..CardMetrics::new("x")
        };
        let rate = calculate_demand_rate(&card, &IpsConfig::default());
        assert!((rate - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_liquidity_monotone_and_bounded() {
        let config = IpsConfig::default();
        let mut previous = -1.0;
        for v in [0.0, 0.01, 0.5, 1.0, 5.0, 100.0] {
            let card = CardMetrics { sales_velocity: v, ..CardMetrics::new("x") };
            let liq = calculate_liquidity(&card, &config);
            assert!((0.0..=1.0).contains(&liq));
            assert!(liq > previous);
            previous = liq;
        }
    }

    #[test]
    fn test_liquidity_nan_is_zero() {
        let card = CardMetrics { sales_velocity: f64::NAN, ..CardMetrics::new("x") };
        assert_eq!(calculate_liquidity(&card, &IpsConfig::default()), 0.0);
    }

    #[test]
    fn test_substitutability() {
        let config = IpsConfig::default();
        let card = CardMetrics::new("a");
        assert_eq!(calculate_substitutability(&card, &[], &config), 1.0);

        let pair = vec![group("g2", &["a", "b"])];
        let in_pair = calculate_substitutability(&card, &pair, &config);
        assert!(in_pair < 1.0);

        let big: Vec<String> = (0..50).map(|i| format!("c{}", i)).chain(["a".to_string()]).collect();
        let huge = vec![SubstitutionGroup { group_id: "g".into(), name: "g".into(), cards: big }];
        assert!((calculate_substitutability(&card, &huge, &config) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_substitutability_uses_tightest_group() {
        let config = IpsConfig::default();
        let card = CardMetrics::new("a");
        let groups = vec![group("small", &["a", "b"]), group("large", &["a", "b", "c", "d"])];
        let value = calculate_substitutability(&card, &groups, &config);
        assert!((value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_margin_safety() {
        assert!((calculate_margin_safety(&sol_ring()) - 0.25).abs() < 1e-9);
        let card = CardMetrics { market_median_price: 5.0, ..sol_ring() };
        assert_eq!(calculate_margin_safety(&card), 0.0);
        let card = CardMetrics { ck_price: 0.0, ..sol_ring() };
        assert_eq!(calculate_margin_safety(&card), 0.0);
    }

    #[test]
    fn test_target_inventory_floor() {
        let config = IpsConfig::default();
        assert_eq!(calculate_target_inventory(0.0, &config), 1);
        assert_eq!(calculate_target_inventory(4.6, &config), 5);
        assert!(calculate_target_inventory(9.0, &config) >= calculate_target_inventory(3.0, &config));
    }

    #[test]
    fn test_tiers() {
        let config = IpsConfig::default();
        assert_eq!(determine_tier(0.9, 0.9, 0.5, &config), Tier::A);
        assert_eq!(determine_tier(0.5, 0.9, 0.5, &config), Tier::B);
        assert_eq!(determine_tier(0.1, 0.9, 0.5, &config), Tier::C);
        assert_eq!(determine_tier(0.9, 0.9, 0.01, &config), Tier::C);
        assert_eq!(determine_tier(0.9, 0.2, 0.5, &config), Tier::C);
    }

    #[test]
    fn test_card_ips_baseline() {
        let entry = calculate_card_ips(&sol_ring(), &[], &IpsConfig::default());
        assert!((entry.demand_rate - 4.6).abs() < 1e-9);
        assert!((entry.margin_safety - 0.25).abs() < 1e-9);
        assert!(entry.ips > 0.0);
        assert!(entry.reasons.iter().any(|r| r.contains("deck")));
        // ceil(4.6) = 5 outranks the alert threshold of 4
        assert_eq!(entry.target_inventory, 5);
        assert_eq!(entry.deficit, 4);
    }

    #[test]
    fn test_alert_threshold_raises_target() {
        let card = CardMetrics { low_inventory_threshold: 12, ..sol_ring() };
        let entry = calculate_card_ips(&card, &[], &IpsConfig::default());
        assert_eq!(entry.target_inventory, 12);
        assert_eq!(entry.deficit, 11);
    }

    #[test]
    fn test_margin_guard_forces_tier_c() {
        let card = CardMetrics { market_median_price: 5.0, ..sol_ring() };
        let entry = calculate_card_ips(&card, &[], &IpsConfig::default());
        assert_eq!(entry.margin_safety, 0.0);
        assert_eq!(entry.tier, Tier::C);
        assert_eq!(entry.ips, 0.0);
    }
}
