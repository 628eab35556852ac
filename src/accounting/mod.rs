use crate::event_sender::{Event, NotificationSink};
use crate::metrics::{CONCURRENCY_CONFLICTS, GROSS_NOTIONAL, PRICE_FALLBACKS, TRANSACTIONS_PROCESSED};
use crate::price_source::PriceSource;
use crate::store::{Book, LedgerStore};
use crate::types::{
    BookKey, GainSplit, Instrument, Lot, LotMatch, PortfolioValuation, Position, RealizedGains, Side, Transaction,
};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

mod charges;
mod error;
mod gains;
mod matching;
mod position;
mod valuation;
pub use charges::{compute_charges, ChargeSchedule};
pub use error::AccountingError;
pub use gains::{accumulate, TaxPolicy};
pub use matching::{holding_days, match_sell, MatchOutcome};
pub use position::apply;
pub use valuation::{summarize, value_holding};

const SEARCH_LIMIT: usize = 20;

/// A trade as submitted by a caller, before pricing and fee stamping.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TransactionRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub owner: Uuid,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TransactionRequest {
    pub fn new(owner: Uuid, symbol: &str, side: Side, quantity: Decimal) -> Self {
        Self {
            id: None,
            owner,
            symbol: symbol.to_string(),
            side,
            quantity,
            price: None,
            timestamp: None,
        }
    }

    pub fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn key(&self) -> BookKey {
        BookKey::new(self.owner, &self.symbol)
    }

    fn validate(&self) -> Result<(), AccountingError> {
        if self.symbol.trim().is_empty() {
            return Err(AccountingError::InvalidTransaction("Symbol must not be empty".into()));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(AccountingError::InvalidTransaction(format!(
                "Quantity must be positive, got {}",
                self.quantity
            )));
        }
        if let Some(price) = self.price {
            if price < Decimal::ZERO {
                return Err(AccountingError::InvalidTransaction(format!(
                    "Price must not be negative, got {}",
                    price
                )));
            }
        }
        Ok(())
    }
}

/// Everything one transaction changed in its book.
#[derive(Clone, Debug, Serialize)]
pub struct ProcessedTransaction {
    pub transaction: Transaction,
    pub position: Position,
    /// Set for purchases.
    pub opened_lot: Option<Lot>,
    /// Lots a sale drew down, with their new remaining quantity.
    pub consumed_lots: Vec<Lot>,
    pub lot_matches: Vec<LotMatch>,
    /// Set for sales.
    pub gain_split: Option<GainSplit>,
    /// Set for sales.
    pub realized_gains: Option<RealizedGains>,
}

/// Apply a stamped transaction to the current state of its book.
pub fn settle(book: Book, transaction: Transaction, tax: &TaxPolicy) -> Result<ProcessedTransaction, AccountingError> {
    let key = transaction.key();
    let position = apply(
        book.position,
        &key,
        transaction.side,
        transaction.quantity,
        transaction.price,
        transaction.timestamp,
    )?;
    let processed = match transaction.side {
        Side::Buy => ProcessedTransaction {
            opened_lot: Some(Lot::opened_by(&transaction)),
            transaction,
            position,
            consumed_lots: Vec::new(),
            lot_matches: Vec::new(),
            gain_split: None,
            realized_gains: None,
        },
        Side::Sell => {
            let outcome = match_sell(&transaction, book.open_lots, tax.long_term_after_days)?;
            let gains = accumulate(book.gains, &key, &outcome.split, tax);
            ProcessedTransaction {
                transaction,
                position,
                opened_lot: None,
                consumed_lots: outcome.lots,
                lot_matches: outcome.matches,
                gain_split: Some(outcome.split),
                realized_gains: Some(gains),
            }
        }
    };
    Ok(processed)
}

/// Entry point for recording trades and reading the resulting books.
pub struct Accountant {
    store: Arc<dyn LedgerStore>,
    prices: Arc<dyn PriceSource>,
    notifier: Arc<dyn NotificationSink>,
    charges: ChargeSchedule,
    tax: TaxPolicy,
}

impl Accountant {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        prices: Arc<dyn PriceSource>,
        notifier: Arc<dyn NotificationSink>,
        charges: ChargeSchedule,
        tax: TaxPolicy,
    ) -> Self {
        Self {
            store,
            prices,
            notifier,
            charges,
            tax,
        }
    }

    async fn known_instrument(&self, symbol: &str) -> Result<Instrument, AccountingError> {
        self.store
            .instrument(symbol)
            .await?
            .ok_or_else(|| AccountingError::UnknownInstrument(symbol.to_string()))
    }

    /// Live price, or the position's average cost (zero without a position) when the
    /// price source fails.
    async fn price_or_fallback(&self, instrument: &Instrument, key: &BookKey) -> Result<Decimal, AccountingError> {
        match self.prices.current_price(instrument).await {
            Ok(price) => Ok(price),
            Err(e) => {
                let fallback = self
                    .store
                    .position(key)
                    .await?
                    .map(|position| position.average_cost)
                    .unwrap_or(Decimal::ZERO);
                warn!(symbol = %instrument.symbol, %fallback, "Price lookup failed, using fallback: {}", e);
                PRICE_FALLBACKS.with_label_values(&[&instrument.symbol]).inc();
                Ok(fallback)
            }
        }
    }

    #[tracing::instrument(skip(self, request), fields(owner = %request.owner, symbol = %request.symbol, side = %request.side))]
    pub async fn process_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<ProcessedTransaction, AccountingError> {
        request.validate()?;
        let key = request.key();
        let instrument = self.known_instrument(&request.symbol).await?;
        let price = match request.price {
            Some(price) => price,
            None => self.price_or_fallback(&instrument, &key).await?,
        };
        let charges = compute_charges(&self.charges, request.side, price, request.quantity)?;
        let transaction = Transaction::new(
            request.id.unwrap_or_else(Uuid::new_v4),
            request.owner,
            instrument.symbol,
            request.side,
            request.quantity,
            price,
            request.timestamp.unwrap_or_else(Utc::now),
            charges,
        );

        let tax = self.tax.clone();
        let processed = match self
            .store
            .transact(&key, Box::new(move |book| settle(book, transaction, &tax)))
            .await
        {
            Ok(processed) => processed,
            Err(e) => {
                if e.is_retryable() {
                    CONCURRENCY_CONFLICTS.inc();
                }
                return Err(e);
            }
        };

        let transaction = &processed.transaction;
        TRANSACTIONS_PROCESSED
            .with_label_values(&[&transaction.side.to_string()])
            .inc();
        GROSS_NOTIONAL
            .with_label_values(&[&transaction.symbol])
            .inc_by(transaction.notional().to_f64().unwrap_or_default());
        info!(
            id = %transaction.id,
            quantity = %transaction.quantity,
            price = %transaction.price,
            charges = %transaction.total_charges(),
            "Processed transaction"
        );

        self.notifier.notify(Event::Transaction(processed.transaction.clone()));
        self.notifier.notify(Event::Position(processed.position.clone()));
        if let Some(gains) = &processed.realized_gains {
            self.notifier.notify(Event::RealizedGains(gains.clone()));
        }
        Ok(processed)
    }

    pub async fn positions(&self, owner: Uuid) -> Result<Vec<Position>, AccountingError> {
        self.store.positions(owner).await
    }

    pub async fn realized_gains(&self, owner: Uuid) -> Result<Vec<RealizedGains>, AccountingError> {
        self.store.realized_gains(owner).await
    }

    pub async fn transactions(&self, owner: Uuid) -> Result<Vec<Transaction>, AccountingError> {
        self.store.transactions(owner).await
    }

    /// Lots of the book with quantity left to sell, oldest first.
    pub async fn open_lots(&self, owner: Uuid, symbol: &str) -> Result<Vec<Lot>, AccountingError> {
        let lots = self.store.lots(&BookKey::new(owner, symbol)).await?;
        Ok(lots.into_iter().filter(Lot::is_open).collect())
    }

    pub async fn lot_matches(&self, owner: Uuid, symbol: &str) -> Result<Vec<LotMatch>, AccountingError> {
        self.store.lot_matches(&BookKey::new(owner, symbol)).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn portfolio(&self, owner: Uuid) -> Result<PortfolioValuation, AccountingError> {
        let mut holdings = Vec::new();
        for position in self.store.positions(owner).await? {
            if !position.is_open() {
                continue;
            }
            let instrument = self.store.instrument(&position.symbol).await?;
            let (name, price) = match &instrument {
                Some(instrument) => match self.prices.current_price(instrument).await {
                    Ok(price) => (instrument.name.clone(), Some(price)),
                    Err(e) => {
                        warn!(symbol = %position.symbol, "Valuing at average cost: {}", e);
                        PRICE_FALLBACKS.with_label_values(&[&position.symbol]).inc();
                        (instrument.name.clone(), None)
                    }
                },
                None => (position.symbol.clone(), None),
            };
            holdings.push(value_holding(&position, &name, price));
        }
        let valuation = summarize(owner, holdings);
        debug!(net_worth = %valuation.net_worth, holdings = valuation.holdings.len(), "Valued portfolio");
        Ok(valuation)
    }

    /// Current price of a registered instrument, `None` when no quote is available.
    #[tracing::instrument(skip(self))]
    pub async fn live_price(&self, symbol: &str) -> Result<Option<Decimal>, AccountingError> {
        let instrument = self.known_instrument(symbol).await?;
        match self.prices.current_price(&instrument).await {
            Ok(price) => Ok(Some(price)),
            Err(e) => {
                warn!("Unable to fetch price: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn search_instruments(&self, query: &str) -> Result<Vec<Instrument>, AccountingError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AccountingError::InvalidQuery("Please provide a search query".into()));
        }
        self.store.search_instruments(query, SEARCH_LIMIT).await
    }

    /// Returns whether the instrument was created. Existing instruments are left as they are.
    #[tracing::instrument(skip(self, instrument), fields(symbol = %instrument.symbol))]
    pub async fn register_instrument(&self, instrument: Instrument) -> Result<bool, AccountingError> {
        if instrument.symbol.trim().is_empty() {
            return Err(AccountingError::InvalidQuery("Symbol must not be empty".into()));
        }
        let created = self.store.save_instrument(&instrument).await?;
        if created {
            info!("Registered instrument");
        }
        Ok(created)
    }
}
