use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub mod accounting;
mod db;
pub mod event_sender;
pub mod instrument_import;
mod kafka;
pub mod metrics;
pub mod price_source;
pub mod price_updater;
pub mod settings;
pub mod store;
pub mod types;
mod webserver;
pub use accounting::{Accountant, AccountingError, ProcessedTransaction, TransactionRequest};
pub use event_sender::{Event, EventSenderHandle, NotificationSink, NullSink};
pub use price_source::{PriceError, PriceSource, YahooPriceSource};
pub use price_updater::PriceUpdater;
pub use settings::Settings;
pub use store::{LedgerStore, MemoryStore, PostgresStore};

pub async fn run(settings: Settings) -> Result<()> {
    let store: Arc<dyn LedgerStore> = Arc::new(
        PostgresStore::connect(&settings.database.connection_string(), settings.database.connections)
            .await
            .context("Failed to set up ledger store")?,
    );
    let notifier = kafka::notification_sink(settings.kafka.as_ref())?;
    let prices: Arc<dyn PriceSource> =
        Arc::new(YahooPriceSource::new(&settings.pricing).context("Failed to create price source")?);
    let accountant = Arc::new(Accountant::new(
        store.clone(),
        prices.clone(),
        notifier.clone(),
        settings.charges,
        settings.tax,
    ));

    if let Some(listing) = &settings.app.instrument_listing {
        instrument_import::import_instrument_file(&accountant, Path::new(listing)).await?;
    }

    if settings.app.price_refresh_seconds > 0 {
        let updater = PriceUpdater::new(
            store,
            prices,
            notifier,
            Duration::from_secs(settings.app.price_refresh_seconds),
        );
        tokio::spawn(updater.run());
    }
    info!(port = settings.webserver.port, "Starting webserver");
    webserver::run(settings.webserver.port, accountant).await;
    Ok(())
}
