use super::BookKey;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use tokio_postgres::Row;
use uuid::Uuid;

/// Gain realized by a single sale, bucketed by holding period.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct GainSplit {
    pub short_term: Decimal,
    pub long_term: Decimal,
    /// Quantity sold beyond the recorded lots. It carries no cost basis and no gain.
    pub unmatched_quantity: Decimal,
}

impl GainSplit {
    pub fn total(&self) -> Decimal {
        self.short_term + self.long_term
    }

    pub fn is_zero(&self) -> bool {
        self.short_term.is_zero() && self.long_term.is_zero()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RealizedGains {
    pub owner: Uuid,
    pub symbol: String,
    pub realized: Decimal,
    pub short_term: Decimal,
    pub long_term: Decimal,
    pub tax_liability: Decimal,
}

impl RealizedGains {
    pub fn zero(key: &BookKey) -> Self {
        Self {
            owner: key.owner,
            symbol: key.symbol.clone(),
            realized: Decimal::ZERO,
            short_term: Decimal::ZERO,
            long_term: Decimal::ZERO,
            tax_liability: Decimal::ZERO,
        }
    }

    pub fn key(&self) -> BookKey {
        BookKey::new(self.owner, &self.symbol)
    }
}

impl TryFrom<Row> for RealizedGains {
    type Error = tokio_postgres::Error;
    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(Self {
            owner: row.try_get("owner")?,
            symbol: row.try_get("symbol")?,
            realized: row.try_get("realized")?,
            short_term: row.try_get("short_term")?,
            long_term: row.try_get("long_term")?,
            tax_liability: row.try_get("tax_liability")?,
        })
    }
}
