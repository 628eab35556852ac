use crate::types::{HoldingSummary, PortfolioValuation, Position};
use chrono::Utc;
use rust_decimal::prelude::*;
use uuid::Uuid;

fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Mark a position to market. `current_price` of `None` values the position at its
/// average cost.
pub fn value_holding(position: &Position, name: &str, current_price: Option<Decimal>) -> HoldingSummary {
    let live_price = current_price.is_some();
    let current_price = round2(current_price.unwrap_or(position.average_cost));
    let total_investment = round2(position.cost_basis());
    let current_value = round2(current_price * position.quantity);
    let unrealized_gain = current_value - total_investment;
    let percentage_return = if total_investment.is_zero() {
        Decimal::ZERO
    } else {
        round2(unrealized_gain / total_investment * Decimal::ONE_HUNDRED)
    };
    HoldingSummary {
        symbol: position.symbol.clone(),
        name: name.to_string(),
        quantity: position.quantity,
        average_cost: position.average_cost,
        current_price,
        live_price,
        total_investment,
        current_value,
        unrealized_gain,
        percentage_return,
    }
}

pub fn summarize(owner: Uuid, holdings: Vec<HoldingSummary>) -> PortfolioValuation {
    let net_worth: Decimal = holdings.iter().map(|h| h.current_value).sum();
    let total_investment: Decimal = holdings.iter().map(|h| h.total_investment).sum();
    let unrealized_gain: Decimal = holdings.iter().map(|h| h.unrealized_gain).sum();
    PortfolioValuation {
        owner,
        holdings,
        net_worth,
        total_investment,
        unrealized_gain,
        valued_at: Utc::now(),
    }
}
