use thiserror::Error;
use tokio_postgres::error::SqlState;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AccountingError {
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Unknown instrument `{0}`")]
    UnknownInstrument(String),

    #[error("Transaction {0} has already been processed")]
    DuplicateTransaction(Uuid),

    #[error("Concurrent update conflict on {0}")]
    ConcurrencyConflict(String),

    #[error("Storage operation failed: {0}")]
    Storage(#[source] tokio_postgres::Error),
}

impl AccountingError {
    /// An amount too large to represent.
    pub fn out_of_range() -> Self {
        AccountingError::InvalidTransaction("amount out of range".into())
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AccountingError::ConcurrencyConflict(_))
    }
}

impl From<tokio_postgres::Error> for AccountingError {
    fn from(e: tokio_postgres::Error) -> Self {
        match e.code() {
            Some(code) if *code == SqlState::T_R_SERIALIZATION_FAILURE || *code == SqlState::T_R_DEADLOCK_DETECTED => {
                AccountingError::ConcurrencyConflict(e.to_string())
            }
            _ => AccountingError::Storage(e),
        }
    }
}
