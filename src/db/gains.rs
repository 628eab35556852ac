use crate::types::{BookKey, RealizedGains};
use std::convert::TryInto;
use tokio_postgres::{Error, GenericClient};
use tracing::trace;
use uuid::Uuid;

#[tracing::instrument(skip(client, key))]
pub async fn get_realized_gains<T: GenericClient>(client: &T, key: &BookKey) -> Result<Option<RealizedGains>, Error> {
    trace!(%key, "Fetching realized gains");
    client
        .query_opt(
            "SELECT * FROM realized_gains WHERE owner = $1 AND symbol = $2",
            &[&key.owner, &key.symbol],
        )
        .await?
        .map(TryInto::try_into)
        .transpose()
}

#[tracing::instrument(skip(client, owner))]
pub async fn get_realized_gains_by_owner<T: GenericClient>(
    client: &T,
    owner: Uuid,
) -> Result<Vec<RealizedGains>, Error> {
    trace!(%owner, "Fetching realized gains for owner");
    client
        .query(
            "SELECT * FROM realized_gains WHERE owner = $1 ORDER BY symbol",
            &[&owner],
        )
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}

#[tracing::instrument(skip(client, gains))]
pub async fn upsert_realized_gains<T: GenericClient>(client: &T, gains: &RealizedGains) -> Result<(), Error> {
    trace!(owner = %gains.owner, symbol = %gains.symbol, "Upserting realized gains");
    client
        .execute(
            r#"INSERT INTO realized_gains (owner, symbol, realized, short_term, long_term, tax_liability) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (owner, symbol) DO UPDATE SET realized = $3, short_term = $4, long_term = $5, tax_liability = $6"#,
            &[
                &gains.owner,
                &gains.symbol,
                &gains.realized,
                &gains.short_term,
                &gains.long_term,
                &gains.tax_liability,
            ],
        )
        .await?;
    Ok(())
}
