use super::BookKey;
use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};
use tokio_postgres::Row;
use uuid::Uuid;

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, ToSql, FromSql)]
#[serde(rename_all = "UPPERCASE")]
#[postgres(name = "side")]
pub enum Side {
    #[postgres(name = "buy")]
    Buy,
    #[postgres(name = "sell")]
    Sell,
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

/// Fees stamped onto a transaction at trade time.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ChargeBreakdown {
    pub brokerage: Decimal,
    pub transaction_tax: Decimal,
    pub clearing_fee: Decimal,
    pub regulatory_fee: Decimal,
    pub stamp_duty: Decimal,
}

impl ChargeBreakdown {
    pub fn total(&self) -> Decimal {
        (self.brokerage + self.transaction_tax + self.clearing_fee + self.regulatory_fee + self.stamp_duty).round_dp(2)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub owner: Uuid,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
    pub charges: ChargeBreakdown,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    #[tracing::instrument(skip(id, owner, symbol, side, quantity, price, timestamp, charges))]
    pub fn new(
        id: Uuid,
        owner: Uuid,
        symbol: String,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        timestamp: DateTime<Utc>,
        charges: ChargeBreakdown,
    ) -> Self {
        tracing::trace!(%id, %owner, %symbol, %side, %quantity, %price, %timestamp, "New Transaction");
        Self {
            id,
            owner,
            symbol,
            side,
            quantity,
            price,
            timestamp,
            charges,
        }
    }

    pub fn key(&self) -> BookKey {
        BookKey::new(self.owner, &self.symbol)
    }

    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }

    pub fn total_charges(&self) -> Decimal {
        self.charges.total()
    }
}

impl TryFrom<Row> for Transaction {
    type Error = tokio_postgres::Error;
    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner: row.try_get("owner")?,
            symbol: row.try_get("symbol")?,
            side: row.try_get("side")?,
            quantity: row.try_get("quantity")?,
            price: row.try_get("price")?,
            timestamp: row.try_get("timestamp")?,
            charges: ChargeBreakdown {
                brokerage: row.try_get("brokerage")?,
                transaction_tax: row.try_get("transaction_tax")?,
                clearing_fee: row.try_get("clearing_fee")?,
                regulatory_fee: row.try_get("regulatory_fee")?,
                stamp_duty: row.try_get("stamp_duty")?,
            },
        })
    }
}
