//! Postgres-backed remote ledger.

use async_trait::async_trait;
use itemkeeper_db::models::ledger::{LedgerRow, LedgerTable};
use itemkeeper_db::repositories::LedgerRepo;
use itemkeeper_db::DbPool;

use crate::ledger::{LedgerError, RemoteLedger, RowOrder};

/// [`RemoteLedger`] over [`LedgerRepo`].
#[derive(Clone)]
pub struct PgLedger {
    pool: DbPool,
}

impl PgLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl RemoteLedger for PgLedger {
    async fn upsert(&self, table: LedgerTable, rows: &[LedgerRow]) -> Result<u64, LedgerError> {
        LedgerRepo::upsert(&self.pool, table, rows)
            .await
            .map_err(LedgerError::from_sqlx)
    }

    async fn insert(&self, table: LedgerTable, rows: &[LedgerRow]) -> Result<u64, LedgerError> {
        LedgerRepo::insert(&self.pool, table, rows)
            .await
            .map_err(LedgerError::from_sqlx)
    }

    async fn delete(&self, table: LedgerTable, id: &str, owner: &str) -> Result<bool, LedgerError> {
        LedgerRepo::delete(&self.pool, table, id, owner)
            .await
            .map_err(LedgerError::from_sqlx)
    }

    async fn select(
        &self,
        table: LedgerTable,
        owner: &str,
        order: RowOrder,
    ) -> Result<Vec<LedgerRow>, LedgerError> {
        let newest_first = order == RowOrder::NewestFirst;
        LedgerRepo::list_for_owner(&self.pool, table, owner, newest_first)
            .await
            .map_err(LedgerError::from_sqlx)
    }

    async fn count(&self, table: LedgerTable, owner: &str) -> Result<u64, LedgerError> {
        let n = LedgerRepo::count_for_owner(&self.pool, table, owner)
            .await
            .map_err(LedgerError::from_sqlx)?;
        Ok(u64::try_from(n).unwrap_or(0))
    }
}
