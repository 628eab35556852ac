use crate::types::{BookKey, Lot};
use std::convert::TryInto;
use tokio_postgres::{Error, GenericClient};
use tracing::trace;

#[tracing::instrument(skip(client, key))]
pub async fn get_lots<T: GenericClient>(client: &T, key: &BookKey) -> Result<Vec<Lot>, Error> {
    trace!(%key, "Fetching lots");
    client
        .query(
            "SELECT * FROM lots WHERE owner = $1 AND symbol = $2 ORDER BY acquired_at, seq",
            &[&key.owner, &key.symbol],
        )
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}

/// Open lots oldest first, row-locked until the enclosing transaction ends.
#[tracing::instrument(skip(client, key))]
pub async fn get_open_lots_for_update<T: GenericClient>(client: &T, key: &BookKey) -> Result<Vec<Lot>, Error> {
    trace!(%key, "Fetching open lots for update");
    client
        .query(
            "SELECT * FROM lots WHERE owner = $1 AND symbol = $2 AND remaining > 0 ORDER BY acquired_at, seq FOR UPDATE",
            &[&key.owner, &key.symbol],
        )
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}

#[tracing::instrument(skip(client, lot))]
pub async fn save_lot<T: GenericClient>(client: &T, lot: &Lot) -> Result<(), Error> {
    trace!(id = %lot.id, "Saving lot");
    client
        .execute(
            "INSERT INTO lots (id, owner, symbol, transaction_id, acquired_at, unit_cost, quantity, remaining) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            &[
                &lot.id,
                &lot.owner,
                &lot.symbol,
                &lot.transaction_id,
                &lot.acquired_at,
                &lot.unit_cost,
                &lot.quantity,
                &lot.remaining,
            ],
        )
        .await?;
    Ok(())
}

#[tracing::instrument(skip(client, lot))]
pub async fn update_lot_remaining<T: GenericClient>(client: &T, lot: &Lot) -> Result<(), Error> {
    trace!(id = %lot.id, remaining = %lot.remaining, "Updating lot");
    client
        .execute("UPDATE lots SET remaining = $1 WHERE id = $2", &[&lot.remaining, &lot.id])
        .await?;
    Ok(())
}
