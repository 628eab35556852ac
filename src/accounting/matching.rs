use super::AccountingError;
use crate::types::{GainSplit, Lot, LotMatch, Term, Transaction};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, trace, warn};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchOutcome {
    pub split: GainSplit,
    /// Every lot touched by the sale, with its reduced remaining quantity.
    pub lots: Vec<Lot>,
    pub matches: Vec<LotMatch>,
}

impl MatchOutcome {
    pub fn consumed(&self) -> Decimal {
        self.matches.iter().map(|m| m.quantity).sum()
    }
}

/// Whole 24-hour periods elapsed between acquisition and sale.
pub fn holding_days(acquired_at: DateTime<Utc>, sold_at: DateTime<Utc>) -> i64 {
    (sold_at - acquired_at).num_days()
}

/// Consume `open_lots` oldest-first to cover `sell`, bucketing the realized gain of each
/// consumed slice by holding period. Lots held for `long_term_after_days` or more are
/// long-term.
#[tracing::instrument(skip(sell, open_lots), fields(id = %sell.id, quantity = %sell.quantity, price = %sell.price))]
pub fn match_sell(
    sell: &Transaction,
    mut open_lots: Vec<Lot>,
    long_term_after_days: i64,
) -> Result<MatchOutcome, AccountingError> {
    // Stable, so lots acquired at the same instant keep their stored order
    open_lots.sort_by_key(|lot| lot.acquired_at);

    let mut remaining = sell.quantity;
    let mut outcome = MatchOutcome::default();
    for mut lot in open_lots {
        if remaining <= Decimal::ZERO {
            break;
        }
        if !lot.is_open() {
            continue;
        }
        let consumed = lot.remaining.min(remaining);
        let gain = sell
            .price
            .checked_sub(lot.unit_cost)
            .and_then(|per_share| per_share.checked_mul(consumed))
            .ok_or_else(AccountingError::out_of_range)?;
        let days = holding_days(lot.acquired_at, sell.timestamp);
        let (bucket, term) = if days < long_term_after_days {
            (&mut outcome.split.short_term, Term::ShortTerm)
        } else {
            (&mut outcome.split.long_term, Term::LongTerm)
        };
        *bucket = bucket.checked_add(gain).ok_or_else(AccountingError::out_of_range)?;
        trace!(lot = %lot.id, %consumed, %gain, days, ?term, "Consumed lot");

        lot.remaining -= consumed;
        remaining -= consumed;
        outcome.matches.push(LotMatch {
            lot_id: lot.id,
            sell_transaction_id: sell.id,
            quantity: consumed,
            unit_cost: lot.unit_cost,
            sell_price: sell.price,
            gain,
            holding_days: days,
            term,
        });
        outcome.lots.push(lot);
    }

    if remaining > Decimal::ZERO {
        warn!(unmatched = %remaining, "Sale exceeds recorded lots, unmatched quantity realizes no gain");
        outcome.split.unmatched_quantity = remaining;
    }
    debug!(
        short_term = %outcome.split.short_term,
        long_term = %outcome.split.long_term,
        consumed = %outcome.consumed(),
        lots = outcome.lots.len(),
        "Matched sale against lots"
    );
    Ok(outcome)
}
