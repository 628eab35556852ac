use super::BookKey;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use tokio_postgres::Row;
use tracing::trace;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub owner: Uuid,
    pub symbol: String,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    #[tracing::instrument(skip(owner, symbol, quantity, average_cost))]
    pub fn new(owner: Uuid, symbol: String, quantity: Decimal, average_cost: Decimal) -> Self {
        trace!(%owner, %symbol, %quantity, %average_cost, "New Position");
        Self {
            owner,
            symbol,
            quantity,
            average_cost,
            updated_at: Utc::now(),
        }
    }

    pub fn empty(key: &BookKey) -> Self {
        Self::new(key.owner, key.symbol.clone(), Decimal::ZERO, Decimal::ZERO)
    }

    pub fn key(&self) -> BookKey {
        BookKey::new(self.owner, &self.symbol)
    }

    pub fn is_open(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    pub fn cost_basis(&self) -> Decimal {
        self.average_cost * self.quantity
    }
}

impl TryFrom<Row> for Position {
    type Error = tokio_postgres::Error;
    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(Self {
            owner: row.try_get("owner")?,
            symbol: row.try_get("symbol")?,
            quantity: row.try_get("quantity")?,
            average_cost: row.try_get("average_cost")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
