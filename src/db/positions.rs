use crate::types::{BookKey, Position};
use std::convert::TryInto;
use tokio_postgres::{Error, GenericClient};
use tracing::trace;
use uuid::Uuid;

#[tracing::instrument(skip(client, key))]
pub async fn get_position<T: GenericClient>(client: &T, key: &BookKey) -> Result<Option<Position>, Error> {
    trace!(%key, "Fetching position");
    client
        .query_opt(
            "SELECT * FROM positions WHERE owner = $1 AND symbol = $2",
            &[&key.owner, &key.symbol],
        )
        .await?
        .map(TryInto::try_into)
        .transpose()
}

#[tracing::instrument(skip(client, owner))]
pub async fn get_positions_by_owner<T: GenericClient>(client: &T, owner: Uuid) -> Result<Vec<Position>, Error> {
    trace!(%owner, "Fetching positions for owner");
    client
        .query("SELECT * FROM positions WHERE owner = $1 ORDER BY symbol", &[&owner])
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}

#[tracing::instrument(skip(client, position))]
pub async fn upsert_position<T: GenericClient>(client: &T, position: &Position) -> Result<(), Error> {
    trace!(owner = %position.owner, symbol = %position.symbol, "Upserting position");
    client
        .execute(
            r#"INSERT INTO positions (owner, symbol, quantity, average_cost, updated_at) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (owner, symbol) DO UPDATE SET quantity = $3, average_cost = $4, updated_at = $5"#,
            &[
                &position.owner,
                &position.symbol,
                &position.quantity,
                &position.average_cost,
                &position.updated_at,
            ],
        )
        .await?;
    Ok(())
}
