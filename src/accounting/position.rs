use super::AccountingError;
use crate::types::{BookKey, Position, Side};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{trace, warn};

/// Apply a fill to the weighted-average-cost position for `key`.
///
/// Purchases blend the average cost by quantity. Sales leave the average cost alone
/// and reduce quantity, clamping at zero when more is sold than is held.
#[tracing::instrument(skip(position, key, at), fields(key = %key))]
pub fn apply(
    position: Option<Position>,
    key: &BookKey,
    side: Side,
    quantity: Decimal,
    price: Decimal,
    at: DateTime<Utc>,
) -> Result<Position, AccountingError> {
    let mut position = position.unwrap_or_else(|| Position::empty(key));
    match side {
        Side::Buy => {
            let new_quantity = position
                .quantity
                .checked_add(quantity)
                .ok_or_else(AccountingError::out_of_range)?;
            position.average_cost = if new_quantity.is_zero() {
                Decimal::ZERO
            } else {
                let held = position.average_cost.checked_mul(position.quantity);
                let bought = price.checked_mul(quantity);
                held.zip(bought)
                    .and_then(|(held, bought)| held.checked_add(bought))
                    .and_then(|cost| cost.checked_div(new_quantity))
                    .ok_or_else(AccountingError::out_of_range)?
            };
            position.quantity = new_quantity;
        }
        Side::Sell => {
            let new_quantity = position.quantity - quantity;
            if new_quantity < Decimal::ZERO {
                warn!(held = %position.quantity, sold = %quantity, "Sold more than held, clamping position at zero");
                position.quantity = Decimal::ZERO;
            } else {
                position.quantity = new_quantity;
            }
        }
    }
    position.updated_at = at;
    trace!(quantity = %position.quantity, average_cost = %position.average_cost, "Applied fill to position");
    Ok(position)
}
