use async_trait::async_trait;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use portfolio_ledger::accounting::{ChargeSchedule, TaxPolicy};
use portfolio_ledger::types::{Instrument, Venue};
use portfolio_ledger::{Accountant, Event, LedgerStore, MemoryStore, NotificationSink, PriceError, PriceSource};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use tracing::subscriber::set_global_default;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("RUST_LOG").is_ok() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        set_global_default(subscriber).unwrap();
    }
});

/// Quotes from a fixed table; symbols missing from it are unavailable.
#[derive(Default)]
pub struct StaticPrices {
    prices: DashMap<String, Decimal>,
}

impl StaticPrices {
    pub fn set(&self, symbol: &str, price: Decimal) {
        self.prices.insert(symbol.to_string(), price);
    }
}

#[async_trait]
impl PriceSource for StaticPrices {
    async fn current_price(&self, instrument: &Instrument) -> Result<Decimal, PriceError> {
        self.prices
            .get(&instrument.symbol)
            .map(|price| *price.value())
            .ok_or_else(|| PriceError::Unavailable(instrument.quote_symbol()))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct TestApp {
    pub accountant: Accountant,
    pub store: Arc<MemoryStore>,
    pub prices: Arc<StaticPrices>,
    pub sink: Arc<RecordingSink>,
    pub owner: Uuid,
}

pub const INSTRUMENTS: [(&str, &str); 4] = [
    ("TCS", "Tata Consultancy Services"),
    ("INFY", "Infosys"),
    ("RELIANCE", "Reliance Industries"),
    ("TATAMOTORS", "Tata Motors"),
];

pub async fn setup() -> TestApp {
    Lazy::force(&TRACING);
    let store = Arc::new(MemoryStore::new());
    for (symbol, name) in INSTRUMENTS.iter() {
        store
            .save_instrument(&Instrument::new(symbol.to_string(), name.to_string(), Venue::Nse))
            .await
            .unwrap();
    }
    let prices = Arc::new(StaticPrices::default());
    let sink = Arc::new(RecordingSink::default());
    let accountant = Accountant::new(
        store.clone(),
        prices.clone(),
        sink.clone(),
        ChargeSchedule::default(),
        TaxPolicy::default(),
    );
    TestApp {
        accountant,
        store,
        prices,
        sink,
        owner: Uuid::new_v4(),
    }
}
