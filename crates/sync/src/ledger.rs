//! The remote ledger capability.

use async_trait::async_trait;
use itemkeeper_db::models::ledger::{LedgerRow, LedgerTable};

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Errors raised by a remote ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Duplicate id: {0}")]
    Conflict(String),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    /// Map a driver error, classifying unique violations as [`Conflict`].
    ///
    /// [`Conflict`]: LedgerError::Conflict
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        let is_duplicate = err
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == UNIQUE_VIOLATION);
        if is_duplicate {
            let detail = err
                .as_database_error()
                .map(|db| db.message().to_string())
                .unwrap_or_default();
            return Self::Conflict(detail);
        }
        Self::Database(err)
    }
}

/// Ordering requested from [`RemoteLedger::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    Unordered,
    /// Descending by `created_at` (active) or `deleted_at` (bin).
    NewestFirst,
}

/// Keyed row storage for the two mirrored tables.
///
/// Every read, write and delete is scoped by owner. Implementations must be
/// safe to share across tasks.
#[async_trait]
pub trait RemoteLedger: Send + Sync {
    /// Insert-or-replace keyed on `id`. Returns rows written.
    async fn upsert(&self, table: LedgerTable, rows: &[LedgerRow]) -> Result<u64, LedgerError>;

    /// Plain insert; an existing id is a [`LedgerError::Conflict`].
    async fn insert(&self, table: LedgerTable, rows: &[LedgerRow]) -> Result<u64, LedgerError>;

    /// Delete by id and owner. Returns whether a row was removed.
    async fn delete(&self, table: LedgerTable, id: &str, owner: &str) -> Result<bool, LedgerError>;

    async fn select(
        &self,
        table: LedgerTable,
        owner: &str,
        order: RowOrder,
    ) -> Result<Vec<LedgerRow>, LedgerError>;

    async fn count(&self, table: LedgerTable, owner: &str) -> Result<u64, LedgerError>;
}
