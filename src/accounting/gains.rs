use crate::types::{BookKey, GainSplit, RealizedGains};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::trace;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TaxPolicy {
    pub short_term_rate: Decimal,
    pub long_term_rate: Decimal,
    pub long_term_after_days: i64,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            short_term_rate: Decimal::new(15, 2),
            long_term_rate: Decimal::new(10, 2),
            long_term_after_days: 365,
        }
    }
}

impl TaxPolicy {
    pub fn liability(&self, short_term: Decimal, long_term: Decimal) -> Decimal {
        self.short_term_rate * short_term + self.long_term_rate * long_term
    }
}

/// Fold a sale's gain split into the cumulative record for `key`. Tax liability is
/// recomputed from the cumulative buckets rather than accumulated.
#[tracing::instrument(skip(existing, key, policy), fields(key = %key))]
pub fn accumulate(
    existing: Option<RealizedGains>,
    key: &BookKey,
    split: &GainSplit,
    policy: &TaxPolicy,
) -> RealizedGains {
    let mut gains = match existing {
        Some(gains) if split.is_zero() => return gains,
        Some(gains) => gains,
        None => RealizedGains::zero(key),
    };
    gains.realized += split.total();
    gains.short_term += split.short_term;
    gains.long_term += split.long_term;
    gains.tax_liability = policy.liability(gains.short_term, gains.long_term);
    trace!(realized = %gains.realized, tax_liability = %gains.tax_liability, "Accumulated gains");
    gains
}
