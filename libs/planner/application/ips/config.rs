//! Tunables for the IPS calculator.

use serde::{Deserialize, Serialize};

/// Relative weight of each demand signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandWeights {
    pub deck: f64,
    pub queued: f64,
    pub velocity: f64,
    pub alert: f64,
}

impl Default for DemandWeights {
    fn default() -> Self {
        Self {
            deck: 0.4,
            queued: 0.3,
            velocity: 0.2,
            alert: 0.1,
        }
    }
}

impl DemandWeights {
    pub fn all_non_negative(&self) -> bool {
        [self.deck, self.queued, self.velocity, self.alert]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

/// Upper bound applied to each demand signal before weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandCaps {
    pub deck: f64,
    pub queued: f64,
    pub velocity: f64,
    pub alert: f64,
}

impl Default for DemandCaps {
    fn default() -> Self {
        Self {
            deck: 10.0,
            queued: 10.0,
            velocity: 10.0,
            alert: 10.0,
        }
    }
}

/// IPS calculator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpsConfig {
    // ═══════════════════════════════════════════════════════════════
    // DEMAND RATE
    // ═══════════════════════════════════════════════════════════════

    pub weights: DemandWeights,

    pub caps: DemandCaps,

    /// Multiplier turning units/day into the 0..10 demand scale
    pub velocity_scale: f64,

    /// Demand points contributed by an enabled low-inventory alert
    pub alert_bump: f64,

    /// Divisor producing `demand_rate_normalized` (IPS in [0,1] with default caps)
    pub demand_normalizer: f64,

    // ═══════════════════════════════════════════════════════════════
    // LIQUIDITY / SUBSTITUTABILITY
    // ═══════════════════════════════════════════════════════════════

    /// k in `velocity / (velocity + k)`; velocity at which liquidity = 0.5
    pub liquidity_half_saturation: f64,

    /// Lowest substitutability any group can produce
    pub substitutability_floor: f64,

    // ═══════════════════════════════════════════════════════════════
    // TIERS
    // ═══════════════════════════════════════════════════════════════

    /// IPS at or above which a card is tier A
    pub tier_a: f64,

    /// IPS at or above which a card is tier B
    pub tier_b: f64,

    /// Margin safety below this forces tier C
    pub min_margin: f64,

    /// Liquidity below this forces tier C
    pub min_liquidity: f64,

    // ═══════════════════════════════════════════════════════════════
    // TARGET INVENTORY
    // ═══════════════════════════════════════════════════════════════

    /// Units of stock to hold per point of demand rate
    pub target_inventory_scale: f64,
}

impl Default for IpsConfig {
    fn default() -> Self {
        Self {
            weights: DemandWeights::default(),
            caps: DemandCaps::default(),
            velocity_scale: 10.0,
            alert_bump: 10.0,
            demand_normalizer: 10.0,

            liquidity_half_saturation: 0.5, // 0.5 sales/day -> liquidity 0.5
            substitutability_floor: 0.3,

            tier_a: 0.8,
            tier_b: 0.4,
            min_margin: 0.05,
            min_liquidity: 0.4,

            target_inventory_scale: 1.0,
        }
    }
}

impl IpsConfig {
    /// Describe the first problem with this configuration, if any
    pub fn problems(&self) -> Option<String> {
        if !self.weights.all_non_negative() {
            return Some("ips.weights must be finite and non-negative".to_string());
        }
        if self.demand_normalizer <= 0.0 {
            return Some("ips.demand_normalizer must be greater than 0".to_string());
        }
        if self.liquidity_half_saturation <= 0.0 {
            return Some("ips.liquidity_half_saturation must be greater than 0".to_string());
        }
        if !(self.substitutability_floor > 0.0 && self.substitutability_floor <= 1.0) {
            return Some("ips.substitutability_floor must be in (0, 1]".to_string());
        }
        if self.tier_b > self.tier_a {
            return Some("ips.tier_b must not exceed ips.tier_a".to_string());
        }
        if self.target_inventory_scale < 0.0 {
            return Some("ips.target_inventory_scale must be non-negative".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(IpsConfig::default().problems().is_none());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = IpsConfig::default();
        config.weights.queued = -0.1;
        assert!(config.problems().is_some());
    }

    #[test]
    fn test_tier_order_rejected() {
        let config = IpsConfig { tier_a: 0.3, tier_b: 0.5, ..IpsConfig::default() };
        assert!(config.problems().unwrap().contains("tier_b"));
    }

    #[test]
    fn test_partial_yaml() {
        let config: IpsConfig = serde_yaml::from_str("tier_a: 0.6\nweights:\n  deck: 0.5\n").unwrap();
        assert_eq!(config.tier_a, 0.6);
        assert_eq!(config.weights.deck, 0.5);
        assert_eq!(config.weights.queued, 0.3);
        assert_eq!(config.tier_b, 0.4);
    }
}
