use crate::types::Transaction;
use std::convert::TryInto;
use tokio_postgres::{Error, GenericClient};
use tracing::trace;
use uuid::Uuid;

#[tracing::instrument(skip(client, owner))]
pub async fn get_transactions_by_owner<T: GenericClient>(client: &T, owner: Uuid) -> Result<Vec<Transaction>, Error> {
    trace!(%owner, "Fetching transactions for owner");
    client
        .query(
            "SELECT * FROM transactions WHERE owner = $1 ORDER BY timestamp",
            &[&owner],
        )
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}

#[tracing::instrument(skip(client, id))]
pub async fn transaction_exists<T: GenericClient>(client: &T, id: Uuid) -> Result<bool, Error> {
    trace!(%id, "Checking for transaction");
    let row = client
        .query_one("SELECT EXISTS(SELECT 1 FROM transactions WHERE id = $1)", &[&id])
        .await?;
    row.try_get(0)
}

#[tracing::instrument(skip(client, transaction))]
pub async fn save_transaction<T: GenericClient>(client: &T, transaction: &Transaction) -> Result<(), Error> {
    trace!(id = %transaction.id, "Saving transaction");
    let charges = &transaction.charges;
    client
        .execute(
            "INSERT INTO transactions (id, owner, symbol, side, quantity, price, timestamp, brokerage, transaction_tax, clearing_fee, regulatory_fee, stamp_duty) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            &[
                &transaction.id,
                &transaction.owner,
                &transaction.symbol,
                &transaction.side,
                &transaction.quantity,
                &transaction.price,
                &transaction.timestamp,
                &charges.brokerage,
                &charges.transaction_tax,
                &charges.clearing_fee,
                &charges.regulatory_fee,
                &charges.stamp_duty,
            ],
        )
        .await?;
    Ok(())
}
