use crate::types::{Instrument, PriceUpdate};
use std::convert::TryInto;
use tokio_postgres::{Error, GenericClient};
use tracing::trace;

#[tracing::instrument(skip(client))]
pub async fn get_instruments<T: GenericClient>(client: &T) -> Result<Vec<Instrument>, Error> {
    trace!("Fetching all instruments");
    client
        .query("SELECT * FROM instruments ORDER BY symbol", &[])
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}

#[tracing::instrument(skip(client, symbol))]
pub async fn get_instrument<T: GenericClient>(client: &T, symbol: &str) -> Result<Option<Instrument>, Error> {
    trace!(%symbol, "Fetching instrument");
    client
        .query_opt("SELECT * FROM instruments WHERE symbol = $1", &[&symbol])
        .await?
        .map(TryInto::try_into)
        .transpose()
}

#[tracing::instrument(skip(client, query, limit))]
pub async fn search_instruments<T: GenericClient>(
    client: &T,
    query: &str,
    limit: usize,
) -> Result<Vec<Instrument>, Error> {
    trace!(%query, limit, "Searching instruments");
    let pattern = format!("%{}%", query);
    let limit = limit as i64;
    client
        .query(
            "SELECT * FROM instruments WHERE symbol ILIKE $1 OR name ILIKE $1 ORDER BY symbol LIMIT $2",
            &[&pattern, &limit],
        )
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}

/// Returns `false` when an instrument with the same symbol already exists.
#[tracing::instrument(skip(client, instrument))]
pub async fn save_instrument<T: GenericClient>(client: &T, instrument: &Instrument) -> Result<bool, Error> {
    trace!(symbol = %instrument.symbol, "Saving instrument");
    let inserted = client
        .execute(
            "INSERT INTO instruments (symbol, name, venue, last_price, last_priced_at) VALUES ($1, $2, $3, $4, $5) ON CONFLICT (symbol) DO NOTHING",
            &[
                &instrument.symbol,
                &instrument.name,
                &instrument.venue.as_str(),
                &instrument.last_price,
                &instrument.last_priced_at,
            ],
        )
        .await?;
    Ok(inserted == 1)
}

#[tracing::instrument(skip(client, update))]
pub async fn update_instrument_price<T: GenericClient>(client: &T, update: &PriceUpdate) -> Result<(), Error> {
    trace!(symbol = %update.symbol, price = %update.price, "Updating instrument price");
    client
        .execute(
            "UPDATE instruments SET last_price = $1, last_priced_at = $2 WHERE symbol = $3",
            &[&update.price, &update.timestamp, &update.symbol],
        )
        .await?;
    Ok(())
}
