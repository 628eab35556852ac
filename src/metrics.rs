use lazy_static::lazy_static;
use prometheus::{CounterVec, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref TRANSACTIONS_PROCESSED: IntCounterVec = IntCounterVec::new(
        Opts::new("transactions_processed", "Number of transactions processed"),
        &["side"]
    )
    .expect("Metric can be created");
    pub static ref GROSS_NOTIONAL: CounterVec = CounterVec::new(
        Opts::new("gross_notional", "Gross notional amount transacted"),
        &["symbol"]
    )
    .expect("Metric can be created");
    pub static ref PRICE_FALLBACKS: IntCounterVec = IntCounterVec::new(
        Opts::new("price_fallbacks", "Price lookups that fell back to average cost"),
        &["symbol"]
    )
    .expect("Metric can be created");
    pub static ref CONCURRENCY_CONFLICTS: IntCounter = IntCounter::new(
        "concurrency_conflicts",
        "Units of work aborted by a storage conflict"
    )
    .expect("Metric can be created");
}

pub fn register_custom_metrics() {
    REGISTRY
        .register(Box::new(TRANSACTIONS_PROCESSED.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(GROSS_NOTIONAL.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(PRICE_FALLBACKS.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(CONCURRENCY_CONFLICTS.clone()))
        .expect("collector can be registered");
}
