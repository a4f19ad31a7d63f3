//! Common test utilities for planner integration tests
//!
//! Shared fixtures and helpers.

#![allow(dead_code)]

use planner::{CardMetrics, Demand, HotListEntry, Offer, Plan, Shipping, Tier};

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// Money comparison tolerance for assertions
pub const EPS: f64 = 1e-6;

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

pub mod fixtures {
    //! Test fixtures for common data types

    use super::*;

    /// Baseline card with moderate demand and healthy margin
    pub fn sol_ring() -> CardMetrics {
        CardMetrics {
            deck_usage_count: 5,
            queued_deck_usage_count: 2,
            sales_velocity: 0.5,
            low_inventory_alert_enabled: true,
            ck_price: 4.0,
            market_median_price: 3.0,
            ..CardMetrics::new("sol-ring")
        }
    }

    /// A card that scores well into tier A
    pub fn staple(card_id: &str) -> CardMetrics {
        CardMetrics {
            deck_usage_count: 10,
            queued_deck_usage_count: 10,
            sales_velocity: 10.0,
            low_inventory_alert_enabled: true,
            ck_price: 10.0,
            market_median_price: 0.5,
            ..CardMetrics::new(card_id)
        }
    }

    pub fn demand(card_id: &str, quantity: u32) -> Demand {
        Demand::new(card_id, quantity)
    }

    pub fn offer(card_id: &str, seller_id: &str, price: f64, quantity: u32) -> Offer {
        Offer::new(card_id, seller_id, price, quantity)
    }

    /// Offer from a seller charging 3.00 shipping, free from 10.00
    pub fn offer_with_threshold(card_id: &str, seller_id: &str, price: f64, quantity: u32) -> Offer {
        Offer::new(card_id, seller_id, price, quantity).with_shipping(Shipping::new(3.0, 10.0))
    }

    pub fn hot(card_id: &str, ips: f64, tier: Tier, target: u32) -> HotListEntry {
        HotListEntry::new(card_id, ips, tier, target)
    }
}

/// Print a plan when TEST_VERBOSE is set
pub fn dump(plan: &Plan) {
    crate::verbose_println!(
        "{}",
        serde_json::to_string_pretty(plan).unwrap_or_default()
    );
}
