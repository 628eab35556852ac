use super::{Book, BookWork, LedgerStore};
use crate::accounting::{AccountingError, ProcessedTransaction};
use crate::types::{BookKey, Instrument, Lot, LotMatch, Position, PriceUpdate, RealizedGains, Transaction};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace};
use uuid::Uuid;

#[derive(Debug, Default)]
struct BookState {
    position: Option<Position>,
    /// Every lot ever opened for the book, in acquisition order.
    lots: Vec<Lot>,
    gains: Option<RealizedGains>,
    transactions: Vec<Transaction>,
    matches: Vec<LotMatch>,
}

impl BookState {
    fn snapshot(&self) -> Book {
        Book {
            position: self.position.clone(),
            open_lots: self.lots.iter().filter(|lot| lot.is_open()).cloned().collect(),
            gains: self.gains.clone(),
        }
    }

    fn apply(&mut self, processed: &ProcessedTransaction) {
        self.position = Some(processed.position.clone());
        for lot in &processed.consumed_lots {
            if let Some(stored) = self.lots.iter_mut().find(|stored| stored.id == lot.id) {
                stored.remaining = lot.remaining;
            }
        }
        if let Some(lot) = &processed.opened_lot {
            let index = self
                .lots
                .iter()
                .position(|stored| stored.acquired_at > lot.acquired_at)
                .unwrap_or_else(|| self.lots.len());
            self.lots.insert(index, lot.clone());
        }
        if let Some(gains) = &processed.realized_gains {
            self.gains = Some(gains.clone());
        }
        self.transactions.push(processed.transaction.clone());
        self.matches.extend(processed.lot_matches.iter().cloned());
    }
}

/// Process-local store. Each book sits behind its own async mutex, so units of work on
/// the same (owner, instrument) run one at a time while different books run in parallel.
#[derive(Default)]
pub struct MemoryStore {
    instruments: DashMap<String, Instrument>,
    books: DashMap<BookKey, Arc<Mutex<BookState>>>,
    transaction_ids: DashMap<Uuid, BookKey>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn book(&self, key: &BookKey) -> Arc<Mutex<BookState>> {
        Arc::clone(self.books.entry(key.clone()).or_default().value())
    }

    fn books_for(&self, owner: Uuid) -> Vec<Arc<Mutex<BookState>>> {
        let mut books: Vec<_> = self
            .books
            .iter()
            .filter(|entry| entry.key().owner == owner)
            .map(|entry| (entry.key().symbol.clone(), Arc::clone(entry.value())))
            .collect();
        books.sort_by(|a, b| a.0.cmp(&b.0));
        books.into_iter().map(|(_, book)| book).collect()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    #[tracing::instrument(skip(self, key, work), fields(key = %key))]
    async fn transact(&self, key: &BookKey, work: BookWork) -> Result<ProcessedTransaction, AccountingError> {
        let book = self.book(key);
        let mut state = book.lock().await;
        trace!("Acquired book");
        let processed = work(state.snapshot())?;

        match self.transaction_ids.entry(processed.transaction.id) {
            Entry::Occupied(_) => return Err(AccountingError::DuplicateTransaction(processed.transaction.id)),
            Entry::Vacant(entry) => {
                entry.insert(key.clone());
            }
        }
        state.apply(&processed);
        debug!(id = %processed.transaction.id, "Committed transaction");
        Ok(processed)
    }

    async fn instrument(&self, symbol: &str) -> Result<Option<Instrument>, AccountingError> {
        Ok(self.instruments.get(symbol).map(|entry| entry.value().clone()))
    }

    async fn instruments(&self) -> Result<Vec<Instrument>, AccountingError> {
        let mut instruments: Vec<_> = self.instruments.iter().map(|entry| entry.value().clone()).collect();
        instruments.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(instruments)
    }

    async fn save_instrument(&self, instrument: &Instrument) -> Result<bool, AccountingError> {
        match self.instruments.entry(instrument.symbol.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(instrument.clone());
                Ok(true)
            }
        }
    }

    async fn update_instrument_price(&self, update: &PriceUpdate) -> Result<(), AccountingError> {
        if let Some(mut instrument) = self.instruments.get_mut(&update.symbol) {
            instrument.last_price = Some(update.price);
            instrument.last_priced_at = Some(update.timestamp);
        }
        Ok(())
    }

    async fn search_instruments(&self, query: &str, limit: usize) -> Result<Vec<Instrument>, AccountingError> {
        let mut found: Vec<_> = self
            .instruments
            .iter()
            .filter(|entry| entry.value().matches(query))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        found.truncate(limit);
        Ok(found)
    }

    async fn position(&self, key: &BookKey) -> Result<Option<Position>, AccountingError> {
        let book = match self.books.get(key) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Ok(None),
        };
        let state = book.lock().await;
        Ok(state.position.clone())
    }

    async fn positions(&self, owner: Uuid) -> Result<Vec<Position>, AccountingError> {
        let mut positions = Vec::new();
        for book in self.books_for(owner) {
            if let Some(position) = &book.lock().await.position {
                positions.push(position.clone());
            }
        }
        Ok(positions)
    }

    async fn realized_gains(&self, owner: Uuid) -> Result<Vec<RealizedGains>, AccountingError> {
        let mut gains = Vec::new();
        for book in self.books_for(owner) {
            if let Some(book_gains) = &book.lock().await.gains {
                gains.push(book_gains.clone());
            }
        }
        Ok(gains)
    }

    async fn transactions(&self, owner: Uuid) -> Result<Vec<Transaction>, AccountingError> {
        let mut transactions = Vec::new();
        for book in self.books_for(owner) {
            transactions.extend(book.lock().await.transactions.iter().cloned());
        }
        transactions.sort_by_key(|transaction| transaction.timestamp);
        Ok(transactions)
    }

    async fn lots(&self, key: &BookKey) -> Result<Vec<Lot>, AccountingError> {
        let book = match self.books.get(key) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Ok(Vec::new()),
        };
        let state = book.lock().await;
        Ok(state.lots.clone())
    }

    async fn lot_matches(&self, key: &BookKey) -> Result<Vec<LotMatch>, AccountingError> {
        let book = match self.books.get(key) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Ok(Vec::new()),
        };
        let state = book.lock().await;
        Ok(state.matches.clone())
    }
}
