use crate::types::{BookKey, LotMatch};
use std::convert::TryInto;
use tokio_postgres::{Error, GenericClient};
use tracing::trace;

#[tracing::instrument(skip(client, key))]
pub async fn get_lot_matches<T: GenericClient>(client: &T, key: &BookKey) -> Result<Vec<LotMatch>, Error> {
    trace!(%key, "Fetching lot matches");
    client
        .query(
            r#"SELECT m.* FROM lot_matches m
            INNER JOIN transactions t ON m.sell_transaction_id = t.id
            INNER JOIN lots l ON m.lot_id = l.id
            WHERE t.owner = $1 AND t.symbol = $2
            ORDER BY t.timestamp, l.acquired_at, l.seq"#,
            &[&key.owner, &key.symbol],
        )
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}

#[tracing::instrument(skip(client, lot_match))]
pub async fn save_lot_match<T: GenericClient>(client: &T, lot_match: &LotMatch) -> Result<(), Error> {
    trace!(lot_id = %lot_match.lot_id, sell_transaction_id = %lot_match.sell_transaction_id, "Saving lot match");
    client
        .execute(
            "INSERT INTO lot_matches (lot_id, sell_transaction_id, quantity, unit_cost, sell_price, gain, holding_days, term) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            &[
                &lot_match.lot_id,
                &lot_match.sell_transaction_id,
                &lot_match.quantity,
                &lot_match.unit_cost,
                &lot_match.sell_price,
                &lot_match.gain,
                &lot_match.holding_days,
                &lot_match.term,
            ],
        )
        .await?;
    Ok(())
}
