use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use tokio_postgres::Row;
use tracing::trace;

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    Nse,
    Bse,
    Other,
}

impl Venue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Nse => "nse",
            Venue::Bse => "bse",
            Venue::Other => "other",
        }
    }

    fn quote_suffix(&self) -> &'static str {
        match self {
            Venue::Nse => ".NS",
            Venue::Bse => ".BO",
            Venue::Other => "",
        }
    }
}

impl Default for Venue {
    fn default() -> Self {
        Venue::Nse
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub venue: Venue,
    #[serde(default)]
    pub last_price: Option<Decimal>,
    #[serde(default)]
    pub last_priced_at: Option<DateTime<Utc>>,
}

impl Instrument {
    #[tracing::instrument(skip(symbol, name, venue))]
    pub fn new(symbol: String, name: String, venue: Venue) -> Self {
        trace!(%symbol, %name, ?venue, "New Instrument");
        Self {
            symbol,
            name,
            venue,
            last_price: None,
            last_priced_at: None,
        }
    }

    /// Symbol as understood by the quote provider. Symbols that already carry an
    /// exchange suffix (e.g. `TCS.NS`) are passed through untouched.
    pub fn quote_symbol(&self) -> String {
        if self.symbol.contains('.') {
            self.symbol.clone()
        } else {
            format!("{}{}", self.symbol, self.venue.quote_suffix())
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.symbol.to_lowercase().contains(&query) || self.name.to_lowercase().contains(&query)
    }
}

impl TryFrom<Row> for Instrument {
    type Error = tokio_postgres::Error;
    fn try_from(row: Row) -> Result<Self, Self::Error> {
        let venue: &str = row.try_get("venue")?;
        let venue = match venue {
            "nse" => Venue::Nse,
            "bse" => Venue::Bse,
            _ => Venue::Other,
        };
        Ok(Self {
            symbol: row.try_get("symbol")?,
            name: row.try_get("name")?,
            venue,
            last_price: row.try_get("last_price")?,
            last_priced_at: row.try_get("last_priced_at")?,
        })
    }
}
