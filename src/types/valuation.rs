use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mark-to-market view of a single open position.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HoldingSummary {
    pub symbol: String,
    pub name: String,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub current_price: Decimal,
    /// False when `current_price` is the average-cost fallback.
    pub live_price: bool,
    pub total_investment: Decimal,
    pub current_value: Decimal,
    pub unrealized_gain: Decimal,
    pub percentage_return: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PortfolioValuation {
    pub owner: Uuid,
    pub holdings: Vec<HoldingSummary>,
    pub net_worth: Decimal,
    pub total_investment: Decimal,
    pub unrealized_gain: Decimal,
    pub valued_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PriceUpdate {
    pub symbol: String,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}
