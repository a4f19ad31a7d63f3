//! Phase 0: normalize raw input into indexed, priority-ordered work.
//!
//! - Offers become supply lots, indexed per card by (price, seller id).
//! - Sellers get one profile (marketplace + shipping rule), first declaration wins.
//! - Demands are merged per card, netted against inventory and ordered by priority.
//! - Directives mark forced / preferred / ship-only cards.
//! - The filler pool is built from tier A/B hot-list entries plus ship-only cards.
//!
//! Malformed entries are skipped and reported in `warnings`.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::application::ips::{filter_eligible_hot_list, get_shipping_filler_candidates};
use crate::application::optimizer::config::OptimizerConfig;
use crate::application::optimizer::input::PlannerInput;
use crate::domain::{Budget, DirectiveMode, HotListEntry, Shipping, MONEY_EPSILON};

/// Remaining supply of one offer
#[derive(Debug, Clone)]
pub(crate) struct Lot {
    pub card_id: String,
    pub seller_id: String,
    pub price: f64,
    pub remaining: u32,
}

/// Per-seller facts shared by all of its offers
#[derive(Debug, Clone)]
pub(crate) struct SellerProfile {
    pub marketplace: String,
    pub shipping: Option<Shipping>,
}

/// One card's demand, ready for allocation
#[derive(Debug, Clone)]
pub(crate) struct DemandTask {
    pub card_id: String,
    pub quantity: u32,
    pub max_price: Option<f64>,
    pub forced: bool,
    pub preferred: bool,
    pub ips: f64,
}

/// A card that may be packed as shipping filler
#[derive(Debug, Clone)]
pub(crate) struct FillerCandidate {
    pub entry: HotListEntry,
    /// Most units the plan may buy as filler
    pub max_units: u32,
    pub ship_only: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct NormalizedInput {
    pub lots: Vec<Lot>,
    /// Lot indices per card, sorted by (price asc, seller id asc)
    pub lots_by_card: BTreeMap<String, Vec<usize>>,
    pub sellers: BTreeMap<String, SellerProfile>,
    /// Sorted by priority: IPS desc, PREFER first, card id asc
    pub demands: Vec<DemandTask>,
    pub filler_pool: Vec<FillerCandidate>,
    /// Strictest demand maxPrice per card, kept even when inventory nets the
    /// demand away; absent for forced cards
    pub demand_price_caps: BTreeMap<String, f64>,
    pub reference_prices: BTreeMap<String, f64>,
    pub reference_seller_id: String,
    pub budget: Option<Budget>,
    pub demand_requested: u32,
    pub warnings: Vec<String>,
}

impl NormalizedInput {
    /// Priority rank of a demanded card (0 = highest)
    pub fn rank_of(&self, card_id: &str) -> usize {
        self.demands
            .iter()
            .position(|d| d.card_id == card_id)
            .unwrap_or(usize::MAX)
    }

    pub fn max_per_card(&self) -> Option<f64> {
        self.budget.as_ref().and_then(|b| b.max_per_card)
    }

    /// Whether a non-demand purchase of `card_id` at `price` clears every
    /// price ceiling that applies to the card
    pub fn filler_price_allowed(&self, card_id: &str, price: f64) -> bool {
        self.within_card_cap(price)
            && self.within_reference_price(card_id, price)
            && self
                .demand_price_caps
                .get(card_id)
                .map_or(true, |cap| price <= cap + MONEY_EPSILON)
    }

    /// Reference price is the ceiling for any marketplace purchase of a card
    pub fn within_reference_price(&self, card_id: &str, price: f64) -> bool {
        self.reference_prices
            .get(card_id)
            .map_or(true, |ceiling| price <= ceiling + MONEY_EPSILON)
    }

    /// Whether `price` clears the per-card cap
    pub fn within_card_cap(&self, price: f64) -> bool {
        self.max_per_card()
            .map_or(true, |cap| price <= cap + MONEY_EPSILON)
    }
}

pub(crate) fn normalize(input: &PlannerInput, config: &OptimizerConfig) -> NormalizedInput {
    let mut warnings = Vec::new();

    let budget = input.budget.clone().map(|b| sanitize_budget(b, &mut warnings));

    // Offers -> lots + seller profiles
    let mut lots = Vec::new();
    let mut sellers: BTreeMap<String, SellerProfile> = BTreeMap::new();
    for (index, offer) in input.offers.iter().enumerate() {
        if offer.card_id.is_empty() || offer.seller_id.is_empty() {
            warnings.push(format!("offer #{} skipped: missing card or seller id", index));
            continue;
        }
        if !offer.price.is_finite() || offer.price < 0.0 {
            warnings.push(format!(
                "offer #{} ({} from {}) skipped: invalid price {}",
                index, offer.card_id, offer.seller_id, offer.price
            ));
            continue;
        }

        let shipping = match offer.shipping {
            Some(shipping) if !valid_shipping(&shipping) => {
                warnings.push(format!(
                    "offer #{} ({} from {}): invalid shipping rule ignored",
                    index, offer.card_id, offer.seller_id
                ));
                None
            }
            other => other,
        };

        let profile = sellers
            .entry(offer.seller_id.clone())
            .or_insert_with(|| SellerProfile {
                marketplace: offer
                    .marketplace
                    .clone()
                    .unwrap_or_else(|| config.default_marketplace.clone()),
                shipping: None,
            });
        if profile.shipping.is_none() {
            profile.shipping = shipping;
        }

        if offer.quantity_available == 0 {
            continue;
        }
        lots.push(Lot {
            card_id: offer.card_id.clone(),
            seller_id: offer.seller_id.clone(),
            price: offer.price,
            remaining: offer.quantity_available,
        });
    }

    let mut lots_by_card: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, lot) in lots.iter().enumerate() {
        lots_by_card.entry(lot.card_id.clone()).or_default().push(index);
    }
    for indices in lots_by_card.values_mut() {
        indices.sort_by(|&a, &b| {
            lots[a]
                .price
                .total_cmp(&lots[b].price)
                .then_with(|| lots[a].seller_id.cmp(&lots[b].seller_id))
                .then_with(|| a.cmp(&b))
        });
    }

    // Directives
    let mut forced: BTreeMap<String, Option<u32>> = BTreeMap::new();
    let mut preferred: BTreeSet<String> = BTreeSet::new();
    let mut ship_only: BTreeMap<String, Option<u32>> = BTreeMap::new();
    for directive in &input.directives {
        let target = match directive.mode {
            DirectiveMode::Force => &mut forced,
            DirectiveMode::ShipOnly => &mut ship_only,
            DirectiveMode::Prefer => {
                preferred.insert(directive.card_id.clone());
                continue;
            }
        };
        let slot = target.entry(directive.card_id.clone()).or_insert(None);
        if let Some(quantity) = directive.quantity {
            *slot = Some(slot.map_or(quantity, |q| q.max(quantity)));
        }
    }

    // First hot-list entry per card wins
    let mut hot_by_card: BTreeMap<&str, &HotListEntry> = BTreeMap::new();
    for entry in &input.hot_list {
        hot_by_card.entry(entry.card_id.as_str()).or_insert(entry);
    }
    let ips_of = |card_id: &str| -> f64 {
        hot_by_card
            .get(card_id)
            .map(|e| e.ips)
            .filter(|ips| ips.is_finite() && *ips > 0.0)
            .unwrap_or(0.0)
    };

    // Demands: merge per card, keep strictest max price
    let mut merged: BTreeMap<String, (u32, Option<f64>)> = BTreeMap::new();
    for (index, demand) in input.demands.iter().enumerate() {
        if let Some(max_price) = demand.max_price {
            if !max_price.is_finite() || max_price < 0.0 {
                warnings.push(format!(
                    "demand #{} ({}) skipped: invalid maxPrice {}",
                    index, demand.card_id, max_price
                ));
                continue;
            }
        }
        let slot = merged.entry(demand.card_id.clone()).or_insert((0, None));
        slot.0 = slot.0.saturating_add(demand.quantity);
        slot.1 = match (slot.1, demand.max_price) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
    }

    let demand_price_caps: BTreeMap<String, f64> = merged
        .iter()
        .filter(|(card_id, _)| !forced.contains_key(*card_id) && !ship_only.contains_key(*card_id))
        .filter_map(|(card_id, (_, max_price))| max_price.map(|p| (card_id.clone(), p)))
        .collect();

    let mut demands = Vec::new();
    let mut demand_requested: u32 = 0;
    for card_id in merged.keys().chain(forced.keys()).collect::<BTreeSet<_>>() {
        let (requested, max_price) = merged.get(card_id).copied().unwrap_or((0, None));

        if ship_only.contains_key(card_id) {
            if requested > 0 {
                warnings.push(format!(
                    "demand for {} ignored: card is SHIP_ONLY",
                    card_id
                ));
            }
            continue;
        }

        let on_hand = input.current_inventory.get(card_id).copied().unwrap_or(0);
        let mut quantity = requested.saturating_sub(on_hand);
        let is_forced = forced.contains_key(card_id);
        if let Some(Some(forced_quantity)) = forced.get(card_id) {
            quantity = quantity.max(*forced_quantity);
        }
        if quantity == 0 {
            continue;
        }

        demand_requested = demand_requested.saturating_add(quantity);
        demands.push(DemandTask {
            card_id: card_id.clone(),
            quantity,
            max_price,
            forced: is_forced,
            preferred: preferred.contains(card_id),
            ips: ips_of(card_id),
        });
    }
    demands.sort_by(|a, b| {
        b.ips
            .total_cmp(&a.ips)
            .then_with(|| b.preferred.cmp(&a.preferred))
            .then_with(|| a.card_id.cmp(&b.card_id))
    });

    // Filler pool: tier A/B hot-list cards, then ship-only cards
    let mut filler_pool = Vec::new();
    let mut pooled: BTreeSet<String> = BTreeSet::new();
    let hot_candidates = get_shipping_filler_candidates(&filter_eligible_hot_list(&input.hot_list));
    for entry in hot_candidates {
        if !pooled.insert(entry.card_id.clone()) {
            continue;
        }
        let on_hand = input.current_inventory.get(&entry.card_id).copied().unwrap_or(0);
        let room = entry.target_inventory.saturating_sub(on_hand);
        let (max_units, is_ship_only) = match ship_only.get(&entry.card_id) {
            Some(quantity) => (quantity.unwrap_or(room.max(1)), true),
            None => (room, false),
        };
        if max_units == 0 {
            continue;
        }
        filler_pool.push(FillerCandidate {
            entry,
            max_units,
            ship_only: is_ship_only,
        });
    }
    for (card_id, quantity) in &ship_only {
        if !pooled.insert(card_id.clone()) {
            continue;
        }
        let entry = hot_by_card
            .get(card_id.as_str())
            .map(|e| (*e).clone())
            .unwrap_or_else(|| HotListEntry {
                card_id: card_id.clone(),
                card_name: card_id.clone(),
                ..HotListEntry::default()
            });
        let on_hand = input.current_inventory.get(card_id).copied().unwrap_or(0);
        let room = match entry.target_inventory {
            0 => u32::MAX,
            target => target.saturating_sub(on_hand),
        };
        let max_units = quantity.unwrap_or(room);
        if max_units == 0 {
            continue;
        }
        filler_pool.push(FillerCandidate {
            entry,
            max_units,
            ship_only: true,
        });
    }

    // Reference prices
    let mut reference_prices = BTreeMap::new();
    for (card_id, price) in &input.card_kingdom_prices {
        if price.is_finite() && *price >= 0.0 {
            reference_prices.insert(card_id.clone(), *price);
        } else {
            warnings.push(format!("reference price for {} ignored: {}", card_id, price));
        }
    }

    let mut reference_seller_id = config.reference_seller_id.clone();
    if sellers.contains_key(&reference_seller_id) {
        reference_seller_id = format!("{}-fallback", reference_seller_id);
        warnings.push(format!(
            "seller id {} collides with the reference seller; fallback basket renamed to {}",
            config.reference_seller_id, reference_seller_id
        ));
    }

    debug!(
        "[Normalize] {} lots across {} sellers, {} demands ({} units), {} filler candidates, {} warnings",
        lots.len(),
        sellers.len(),
        demands.len(),
        demand_requested,
        filler_pool.len(),
        warnings.len()
    );

    NormalizedInput {
        lots,
        lots_by_card,
        sellers,
        demands,
        filler_pool,
        demand_price_caps,
        reference_prices,
        reference_seller_id,
        budget,
        demand_requested,
        warnings,
    }
}

fn valid_shipping(shipping: &Shipping) -> bool {
    let ok = |v: Option<f64>| v.map_or(true, |x| x.is_finite() && x >= 0.0);
    ok(shipping.base) && ok(shipping.free_at)
}

/// Drop caps that are not finite non-negative numbers.
fn sanitize_budget(mut budget: Budget, warnings: &mut Vec<String>) -> Budget {
    let mut check = |name: &str, value: &mut Option<f64>| {
        if let Some(v) = *value {
            if !v.is_finite() || v < 0.0 {
                warnings.push(format!("budget.{} ignored: invalid value {}", name, v));
                *value = None;
            }
        }
    };
    check("maxTotalSpend", &mut budget.max_total_spend);
    check("maxPerSeller", &mut budget.max_per_seller);
    check("maxPerCard", &mut budget.max_per_card);
    check("maxSpeculativeSpend", &mut budget.max_speculative_spend);
    check("reserveBudgetPercent", &mut budget.reserve_budget_percent);
    budget
}
