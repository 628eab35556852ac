use super::AccountingError;
use crate::types::{ChargeBreakdown, Side};
use rust_decimal::prelude::*;
use serde::Deserialize;
use tracing::trace;

/// Fee rates for a market. Defaults are Indian equity delivery trades.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChargeSchedule {
    pub brokerage_cap: Decimal,
    pub brokerage_rate: Decimal,
    pub transaction_tax_rate: Decimal,
    /// Applied to brokerage, not notional.
    pub clearing_rate: Decimal,
    pub regulatory_rate: Decimal,
    /// Only levied on purchases.
    pub stamp_rate: Decimal,
}

impl Default for ChargeSchedule {
    fn default() -> Self {
        Self {
            brokerage_cap: Decimal::new(20, 0),
            brokerage_rate: Decimal::new(3, 4),
            transaction_tax_rate: Decimal::new(1, 3),
            clearing_rate: Decimal::new(18, 2),
            regulatory_rate: Decimal::new(1, 6),
            stamp_rate: Decimal::new(3, 5),
        }
    }
}

fn product(a: Decimal, b: Decimal) -> Result<Decimal, AccountingError> {
    a.checked_mul(b).ok_or_else(AccountingError::out_of_range)
}

fn round_charge(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

#[tracing::instrument(skip(schedule))]
pub fn compute_charges(
    schedule: &ChargeSchedule,
    side: Side,
    price: Decimal,
    quantity: Decimal,
) -> Result<ChargeBreakdown, AccountingError> {
    if quantity <= Decimal::ZERO {
        return Err(AccountingError::InvalidTransaction(format!(
            "Quantity must be positive, got {}",
            quantity
        )));
    }
    if price < Decimal::ZERO {
        return Err(AccountingError::InvalidTransaction(format!(
            "Price must not be negative, got {}",
            price
        )));
    }

    let notional = product(price, quantity)?;
    let brokerage = schedule.brokerage_cap.min(product(schedule.brokerage_rate, notional)?);
    let transaction_tax = product(schedule.transaction_tax_rate, notional)?;
    let clearing_fee = product(schedule.clearing_rate, brokerage)?;
    let regulatory_fee = product(schedule.regulatory_rate, notional)?;
    let stamp_duty = match side {
        Side::Buy => product(schedule.stamp_rate, notional)?,
        Side::Sell => Decimal::ZERO,
    };

    let charges = ChargeBreakdown {
        brokerage: round_charge(brokerage),
        transaction_tax: round_charge(transaction_tax),
        clearing_fee: round_charge(clearing_fee),
        regulatory_fee: round_charge(regulatory_fee),
        stamp_duty: round_charge(stamp_duty),
    };
    trace!(%notional, total = %charges.total(), "Computed charges");
    Ok(charges)
}
