use super::Transaction;
use chrono::{DateTime, Utc};
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use tokio_postgres::Row;
use tracing::trace;
use uuid::Uuid;

/// An open (or exhausted) acquisition of shares, consumed by later sales.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Lot {
    pub id: Uuid,
    pub owner: Uuid,
    pub symbol: String,
    pub transaction_id: Uuid,
    pub acquired_at: DateTime<Utc>,
    pub unit_cost: Decimal,
    pub quantity: Decimal,
    pub remaining: Decimal,
}

impl Lot {
    #[tracing::instrument(skip(owner, symbol, transaction_id, acquired_at, unit_cost, quantity))]
    pub fn new(
        owner: Uuid,
        symbol: String,
        transaction_id: Uuid,
        acquired_at: DateTime<Utc>,
        unit_cost: Decimal,
        quantity: Decimal,
    ) -> Self {
        trace!(%owner, %symbol, %transaction_id, %acquired_at, %unit_cost, %quantity, "New Lot");
        Self {
            id: Uuid::new_v4(),
            owner,
            symbol,
            transaction_id,
            acquired_at,
            unit_cost,
            quantity,
            remaining: quantity,
        }
    }

    pub fn opened_by(transaction: &Transaction) -> Self {
        Self::new(
            transaction.owner,
            transaction.symbol.clone(),
            transaction.id,
            transaction.timestamp,
            transaction.price,
            transaction.quantity,
        )
    }

    pub fn is_open(&self) -> bool {
        self.remaining > Decimal::ZERO
    }
}

impl TryFrom<Row> for Lot {
    type Error = tokio_postgres::Error;
    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner: row.try_get("owner")?,
            symbol: row.try_get("symbol")?,
            transaction_id: row.try_get("transaction_id")?,
            acquired_at: row.try_get("acquired_at")?,
            unit_cost: row.try_get("unit_cost")?,
            quantity: row.try_get("quantity")?,
            remaining: row.try_get("remaining")?,
        })
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSql, FromSql)]
#[serde(rename_all = "snake_case")]
#[postgres(name = "holding_term")]
pub enum Term {
    #[postgres(name = "short_term")]
    ShortTerm,
    #[postgres(name = "long_term")]
    LongTerm,
}

/// The part of a sale matched against a single lot.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct LotMatch {
    pub lot_id: Uuid,
    pub sell_transaction_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub sell_price: Decimal,
    pub gain: Decimal,
    pub holding_days: i64,
    pub term: Term,
}

impl TryFrom<Row> for LotMatch {
    type Error = tokio_postgres::Error;
    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(Self {
            lot_id: row.try_get("lot_id")?,
            sell_transaction_id: row.try_get("sell_transaction_id")?,
            quantity: row.try_get("quantity")?,
            unit_cost: row.try_get("unit_cost")?,
            sell_price: row.try_get("sell_price")?,
            gain: row.try_get("gain")?,
            holding_days: row.try_get("holding_days")?,
            term: row.try_get("term")?,
        })
    }
}
