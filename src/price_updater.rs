use crate::accounting::AccountingError;
use crate::event_sender::{Event, NotificationSink};
use crate::price_source::PriceSource;
use crate::store::LedgerStore;
use crate::types::PriceUpdate;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

/// Periodically refreshes the informational last price of every instrument.
pub struct PriceUpdater {
    store: Arc<dyn LedgerStore>,
    prices: Arc<dyn PriceSource>,
    notifier: Arc<dyn NotificationSink>,
    period: Duration,
}

impl PriceUpdater {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        prices: Arc<dyn PriceSource>,
        notifier: Arc<dyn NotificationSink>,
        period: Duration,
    ) -> Self {
        Self {
            store,
            prices,
            notifier,
            period,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn run(self) {
        info!("Starting PriceUpdater");
        let mut ticker = interval(self.period);
        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh().await {
                error!("{:?}", e)
            }
        }
    }

    /// One pass over all instruments. Returns the number of prices updated; instruments
    /// without a quote keep their previous price.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> Result<usize, AccountingError> {
        let mut updated = 0;
        for instrument in self.store.instruments().await? {
            let price = match self.prices.current_price(&instrument).await {
                Ok(price) => price,
                Err(e) => {
                    warn!(symbol = %instrument.symbol, "Skipping price update: {}", e);
                    continue;
                }
            };
            let update = PriceUpdate {
                symbol: instrument.symbol,
                price,
                timestamp: Utc::now(),
            };
            self.store.update_instrument_price(&update).await?;
            self.notifier.notify(Event::Price(update));
            updated += 1;
        }
        debug!(updated, "Refreshed prices");
        Ok(updated)
    }
}
