use super::{Book, BookWork, LedgerStore};
use crate::accounting::{AccountingError, ProcessedTransaction};
use crate::db;
use crate::types::{BookKey, Instrument, Lot, LotMatch, Position, PriceUpdate, RealizedGains, Transaction};
use anyhow::{ensure, Result};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, MutexGuard};
use tokio_postgres::error::SqlState;
use tokio_postgres::Client;
use tracing::{debug, trace};
use uuid::Uuid;

/// Postgres-backed store over a fixed set of connections.
///
/// A unit of work for a book runs in a single database transaction that first takes a
/// transaction-scoped advisory lock on the book key and then row-locks the book's open
/// lots. Books are spread over the connections by key hash, so different books proceed
/// in parallel and the advisory lock keeps writers of the same book serialized even
/// across processes.
pub struct PostgresStore {
    shards: Vec<Mutex<Client>>,
    next: AtomicUsize,
}

impl PostgresStore {
    pub fn new(clients: Vec<Client>) -> Result<Self> {
        ensure!(!clients.is_empty(), "PostgresStore needs at least one connection");
        Ok(Self {
            shards: clients.into_iter().map(Mutex::new).collect(),
            next: AtomicUsize::new(0),
        })
    }

    /// Open `connections` clients against `url`, migrating the schema with the first.
    #[tracing::instrument(skip(url))]
    pub async fn connect(url: &str, connections: usize) -> Result<Self> {
        let mut clients = Vec::with_capacity(connections.max(1));
        for _ in 0..connections.max(1) {
            clients.push(db::connect_client(url).await?);
        }
        if let Some(client) = clients.first_mut() {
            db::run_migrations(client).await?;
        }
        debug!(connections = clients.len(), "Connected to Postgres");
        Self::new(clients)
    }

    async fn shard_for(&self, key: &BookKey) -> MutexGuard<'_, Client> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        self.shards[index].lock().await
    }

    async fn any_shard(&self) -> MutexGuard<'_, Client> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.shards.len();
        self.shards[index].lock().await
    }
}

fn is_duplicate_id(e: &tokio_postgres::Error) -> bool {
    e.as_db_error()
        .map(|db| *db.code() == SqlState::UNIQUE_VIOLATION && db.constraint() == Some("transactions_pkey"))
        .unwrap_or(false)
}

#[async_trait]
impl LedgerStore for PostgresStore {
    #[tracing::instrument(skip(self, key, work), fields(key = %key))]
    async fn transact(&self, key: &BookKey, work: BookWork) -> Result<ProcessedTransaction, AccountingError> {
        let mut client = self.shard_for(key).await;
        let transaction = client.transaction().await?;
        db::lock_book(&transaction, &key.to_string()).await?;
        trace!("Acquired book");

        let book = Book {
            position: db::get_position(&transaction, key).await?,
            open_lots: db::get_open_lots_for_update(&transaction, key).await?,
            gains: db::get_realized_gains(&transaction, key).await?,
        };
        // Dropping `transaction` on any early return rolls it back
        let processed = work(book)?;
        if db::transaction_exists(&transaction, processed.transaction.id).await? {
            return Err(AccountingError::DuplicateTransaction(processed.transaction.id));
        }

        // A concurrent writer on another book can still claim the same id first
        db::save_transaction(&transaction, &processed.transaction)
            .await
            .map_err(|e| {
                if is_duplicate_id(&e) {
                    AccountingError::DuplicateTransaction(processed.transaction.id)
                } else {
                    e.into()
                }
            })?;
        db::upsert_position(&transaction, &processed.position).await?;
        for lot in &processed.consumed_lots {
            db::update_lot_remaining(&transaction, lot).await?;
        }
        if let Some(lot) = &processed.opened_lot {
            db::save_lot(&transaction, lot).await?;
        }
        for lot_match in &processed.lot_matches {
            db::save_lot_match(&transaction, lot_match).await?;
        }
        if let Some(gains) = &processed.realized_gains {
            db::upsert_realized_gains(&transaction, gains).await?;
        }
        transaction.commit().await?;
        debug!(id = %processed.transaction.id, "Committed transaction");
        Ok(processed)
    }

    async fn instrument(&self, symbol: &str) -> Result<Option<Instrument>, AccountingError> {
        let client = self.any_shard().await;
        Ok(db::get_instrument(&*client, symbol).await?)
    }

    async fn instruments(&self) -> Result<Vec<Instrument>, AccountingError> {
        let client = self.any_shard().await;
        Ok(db::get_instruments(&*client).await?)
    }

    async fn save_instrument(&self, instrument: &Instrument) -> Result<bool, AccountingError> {
        let client = self.any_shard().await;
        Ok(db::save_instrument(&*client, instrument).await?)
    }

    async fn update_instrument_price(&self, update: &PriceUpdate) -> Result<(), AccountingError> {
        let client = self.any_shard().await;
        Ok(db::update_instrument_price(&*client, update).await?)
    }

    async fn search_instruments(&self, query: &str, limit: usize) -> Result<Vec<Instrument>, AccountingError> {
        let client = self.any_shard().await;
        Ok(db::search_instruments(&*client, query, limit).await?)
    }

    async fn position(&self, key: &BookKey) -> Result<Option<Position>, AccountingError> {
        let client = self.any_shard().await;
        Ok(db::get_position(&*client, key).await?)
    }

    async fn positions(&self, owner: Uuid) -> Result<Vec<Position>, AccountingError> {
        let client = self.any_shard().await;
        Ok(db::get_positions_by_owner(&*client, owner).await?)
    }

    async fn realized_gains(&self, owner: Uuid) -> Result<Vec<RealizedGains>, AccountingError> {
        let client = self.any_shard().await;
        Ok(db::get_realized_gains_by_owner(&*client, owner).await?)
    }

    async fn transactions(&self, owner: Uuid) -> Result<Vec<Transaction>, AccountingError> {
        let client = self.any_shard().await;
        Ok(db::get_transactions_by_owner(&*client, owner).await?)
    }

    async fn lots(&self, key: &BookKey) -> Result<Vec<Lot>, AccountingError> {
        let client = self.any_shard().await;
        Ok(db::get_lots(&*client, key).await?)
    }

    async fn lot_matches(&self, key: &BookKey) -> Result<Vec<LotMatch>, AccountingError> {
        let client = self.any_shard().await;
        Ok(db::get_lot_matches(&*client, key).await?)
    }
}
