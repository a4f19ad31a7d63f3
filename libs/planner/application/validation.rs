//! Input-shape validation for callers of the core.
//!
//! The core never rejects input: malformed entries that slip through are
//! skipped with a warning. Callers that want the strict schema run these
//! checks first.

use thiserror::Error;

use crate::application::ips::HotListRequest;
use crate::application::optimizer::PlannerInput;
use crate::domain::Shipping;

pub const MAX_DEMANDS: usize = 2_000;
pub const MAX_DIRECTIVES: usize = 500;
pub const MAX_OFFERS: usize = 20_000;
pub const MAX_HOT_LIST: usize = 2_000;
pub const MAX_CARDS: usize = 2_000;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("{field}: {len} entries exceeds the limit of {max}")]
    TooManyEntries {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field}[{index}]: {reason}")]
    InvalidValue {
        field: &'static str,
        index: usize,
        reason: String,
    },

    #[error("Malformed input document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, InputError>;

fn check_len(field: &'static str, len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(InputError::TooManyEntries { field, len, max });
    }
    Ok(())
}

fn invalid(field: &'static str, index: usize, reason: impl Into<String>) -> InputError {
    InputError::InvalidValue {
        field,
        index,
        reason: reason.into(),
    }
}

/// Finite and not negative
fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn check_money(field: &'static str, index: usize, name: &str, value: f64) -> Result<()> {
    if !non_negative(value) {
        return Err(invalid(field, index, format!("{} must be a finite value >= 0, got {}", name, value)));
    }
    Ok(())
}

fn check_shipping(index: usize, shipping: &Shipping) -> Result<()> {
    if let Some(base) = shipping.base {
        check_money("offers", index, "shipping.base", base)?;
    }
    if let Some(free_at) = shipping.free_at {
        check_money("offers", index, "shipping.freeAt", free_at)?;
    }
    Ok(())
}

/// Check a planner input against the schema limits
pub fn validate_planner_input(input: &PlannerInput) -> Result<()> {
    check_len("demands", input.demands.len(), MAX_DEMANDS)?;
    check_len("directives", input.directives.len(), MAX_DIRECTIVES)?;
    check_len("offers", input.offers.len(), MAX_OFFERS)?;
    check_len("hotList", input.hot_list.len(), MAX_HOT_LIST)?;

    for (index, demand) in input.demands.iter().enumerate() {
        if demand.card_id.is_empty() {
            return Err(invalid("demands", index, "cardId cannot be empty"));
        }
        if let Some(max_price) = demand.max_price {
            check_money("demands", index, "maxPrice", max_price)?;
        }
    }

    for (index, directive) in input.directives.iter().enumerate() {
        if directive.card_id.is_empty() {
            return Err(invalid("directives", index, "cardId cannot be empty"));
        }
        if directive.quantity == Some(0) {
            return Err(invalid("directives", index, "quantity must be >= 1 when present"));
        }
    }

    for (index, offer) in input.offers.iter().enumerate() {
        if offer.card_id.is_empty() || offer.seller_id.is_empty() {
            return Err(invalid("offers", index, "cardId and sellerId cannot be empty"));
        }
        check_money("offers", index, "price", offer.price)?;
        if let Some(shipping) = &offer.shipping {
            check_shipping(index, shipping)?;
        }
    }

    for (index, entry) in input.hot_list.iter().enumerate() {
        if !non_negative(entry.ips) {
            return Err(invalid("hotList", index, format!("IPS must be >= 0, got {}", entry.ips)));
        }
    }

    for (index, (card_id, price)) in input.card_kingdom_prices.iter().enumerate() {
        if !non_negative(*price) {
            return Err(invalid(
                "cardKingdomPrices",
                index,
                format!("price for {} must be >= 0, got {}", card_id, price),
            ));
        }
    }

    if let Some(budget) = &input.budget {
        let caps = [
            ("maxTotalSpend", budget.max_total_spend),
            ("maxPerSeller", budget.max_per_seller),
            ("maxPerCard", budget.max_per_card),
            ("maxSpeculativeSpend", budget.max_speculative_spend),
            ("reserveBudgetPercent", budget.reserve_budget_percent),
        ];
        for (name, value) in caps {
            if let Some(value) = value {
                check_money("budget", 0, name, value)?;
            }
        }
        if budget.reserve_budget_percent.map_or(false, |pct| pct > 100.0) {
            return Err(invalid("budget", 0, "reserveBudgetPercent must be <= 100"));
        }
    }

    Ok(())
}

/// Check a hot-list request against the schema limits
pub fn validate_hot_list_request(request: &HotListRequest) -> Result<()> {
    check_len("cards", request.cards.len(), MAX_CARDS)?;

    for (index, card) in request.cards.iter().enumerate() {
        if card.card_id.is_empty() {
            return Err(invalid("cards", index, "cardId cannot be empty"));
        }
        let values = [
            ("salesVelocity", card.sales_velocity),
            ("ckPrice", card.ck_price),
            ("marketMedianPrice", card.market_median_price),
        ];
        for (name, value) in values {
            check_money("cards", index, name, value)?;
        }
    }

    for (index, group) in request.groups.iter().enumerate() {
        if group.cards.is_empty() {
            return Err(invalid("groups", index, "a substitution group needs at least one card"));
        }
    }

    if let Some(config) = &request.config {
        if let Some(problem) = config.problems() {
            return Err(invalid("config", 0, problem));
        }
    }

    Ok(())
}

/// Parse and validate a planner input document
pub fn parse_planner_input(json: &str) -> Result<PlannerInput> {
    let input: PlannerInput = serde_json::from_str(json)?;
    validate_planner_input(&input)?;
    Ok(input)
}

/// Parse and validate a hot-list request document
pub fn parse_hot_list_request(json: &str) -> Result<HotListRequest> {
    let request: HotListRequest = serde_json::from_str(json)?;
    validate_hot_list_request(&request)?;
    Ok(request)
}
