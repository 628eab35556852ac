use crate::accounting::{AccountingError, ProcessedTransaction};
use crate::types::{BookKey, Instrument, Lot, LotMatch, Position, PriceUpdate, RealizedGains, Transaction};
use async_trait::async_trait;
use uuid::Uuid;

mod memory;
mod postgres;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// State of one book as read at the start of a unit of work.
#[derive(Clone, Debug, Default)]
pub struct Book {
    pub position: Option<Position>,
    /// Lots with remaining quantity, oldest first.
    pub open_lots: Vec<Lot>,
    pub gains: Option<RealizedGains>,
}

/// Pure accounting step run inside the store's exclusive section for a book.
pub type BookWork = Box<dyn FnOnce(Book) -> Result<ProcessedTransaction, AccountingError> + Send>;

/// Durable storage for instruments and the per-(owner, instrument) books.
///
/// `transact` is the only way to write a book. Implementations must run the read of the
/// book, the work and the write of every resulting record as one atomic, isolated unit
/// per key: either all of the transaction, position, lots, matches and gains persist or
/// none do.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn transact(&self, key: &BookKey, work: BookWork) -> Result<ProcessedTransaction, AccountingError>;

    async fn instrument(&self, symbol: &str) -> Result<Option<Instrument>, AccountingError>;
    async fn instruments(&self) -> Result<Vec<Instrument>, AccountingError>;
    /// Returns `false` if an instrument with the same symbol already existed.
    async fn save_instrument(&self, instrument: &Instrument) -> Result<bool, AccountingError>;
    async fn update_instrument_price(&self, update: &PriceUpdate) -> Result<(), AccountingError>;
    async fn search_instruments(&self, query: &str, limit: usize) -> Result<Vec<Instrument>, AccountingError>;

    async fn position(&self, key: &BookKey) -> Result<Option<Position>, AccountingError>;
    async fn positions(&self, owner: Uuid) -> Result<Vec<Position>, AccountingError>;
    async fn realized_gains(&self, owner: Uuid) -> Result<Vec<RealizedGains>, AccountingError>;
    async fn transactions(&self, owner: Uuid) -> Result<Vec<Transaction>, AccountingError>;
    async fn lots(&self, key: &BookKey) -> Result<Vec<Lot>, AccountingError>;
    async fn lot_matches(&self, key: &BookKey) -> Result<Vec<LotMatch>, AccountingError>;
}
