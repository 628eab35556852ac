use anyhow::{Context, Result};
use tokio_postgres::{connect, Client, Error, GenericClient, NoTls};
use tracing::{debug, error, trace};

mod gains;
mod instruments;
mod lot_matches;
mod lots;
mod positions;
mod transactions;
pub use gains::*;
pub use instruments::*;
pub use lot_matches::*;
pub use lots::*;
pub use positions::*;
pub use transactions::*;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

#[tracing::instrument(skip(url))]
pub async fn connect_client(url: &str) -> Result<Client> {
    let (client, connection) = connect(url, NoTls)
        .await
        .context("Failed to connect to Postgres")?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("Connection error: {}", e);
        }
    });
    Ok(client)
}

pub async fn run_migrations(client: &mut Client) -> Result<()> {
    debug!("Running migrations");
    let report = embedded::migrations::runner()
        .run_async(client)
        .await
        .context("Failed to run migrations")?;
    for migration in report.applied_migrations() {
        debug!(name = %migration.name(), version = migration.version(), "Applied migration");
    }
    Ok(())
}

/// Serializes writers of one book for the rest of the enclosing database transaction.
#[tracing::instrument(skip(client, key))]
pub async fn lock_book<T: GenericClient>(client: &T, key: &str) -> Result<(), Error> {
    trace!(%key, "Locking book");
    client
        .execute("SELECT pg_advisory_xact_lock(hashtext($1))", &[&key])
        .await?;
    Ok(())
}
