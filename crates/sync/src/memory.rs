//! In-process remote ledger with failure injection.
//!
//! Mirrors the Postgres semantics closely enough for reconciliation tests:
//! upserts never overwrite another owner's row, inserts reject existing
//! ids, and newest-first reads sort on the table's recency column.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use itemkeeper_db::models::ledger::{LedgerRow, LedgerTable};

use crate::ledger::{LedgerError, RemoteLedger, RowOrder};

/// Ledger operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerOp {
    Upsert,
    Insert,
    Delete,
    Select,
    Count,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<LedgerTable, Vec<LedgerRow>>,
    failing: HashSet<(LedgerOp, LedgerTable)>,
}

/// [`RemoteLedger`] held entirely in memory.
#[derive(Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
    writes: AtomicUsize,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `op` on `table` fail with [`LedgerError::Unavailable`] until
    /// [`recover`](Self::recover) is called.
    pub fn fail(&self, op: LedgerOp, table: LedgerTable) {
        self.lock().failing.insert((op, table));
    }

    /// Make every operation on both tables fail.
    pub fn fail_all(&self) {
        let mut inner = self.lock();
        for op in [
            LedgerOp::Upsert,
            LedgerOp::Insert,
            LedgerOp::Delete,
            LedgerOp::Select,
            LedgerOp::Count,
        ] {
            inner.failing.insert((op, LedgerTable::ItemRecords));
            inner.failing.insert((op, LedgerTable::RecycleBin));
        }
    }

    pub fn recover(&self) {
        self.lock().failing.clear();
    }

    /// Seed rows directly, bypassing owner checks and failure injection.
    pub fn seed(&self, table: LedgerTable, rows: impl IntoIterator<Item = LedgerRow>) {
        self.lock().tables.entry(table).or_default().extend(rows);
    }

    /// Every row in `table`, regardless of owner.
    pub fn rows(&self, table: LedgerTable) -> Vec<LedgerRow> {
        self.lock().tables.get(&table).cloned().unwrap_or_default()
    }

    /// Number of upsert, insert and delete calls that reached the ledger.
    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-call.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(inner: &Inner, op: LedgerOp, table: LedgerTable) -> Result<(), LedgerError> {
        if inner.failing.contains(&(op, table)) {
            return Err(LedgerError::Unavailable(format!(
                "{op:?} on {} is failing",
                table.name()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteLedger for MemoryLedger {
    async fn upsert(&self, table: LedgerTable, rows: &[LedgerRow]) -> Result<u64, LedgerError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.lock();
        Self::check(&inner, LedgerOp::Upsert, table)?;

        let stored = inner.tables.entry(table).or_default();
        let mut written = 0;
        for row in rows {
            match stored.iter_mut().find(|r| r.id == row.id) {
                Some(existing) if existing.user_id == row.user_id => {
                    *existing = row.clone();
                    written += 1;
                }
                Some(_) => {}
                None => {
                    stored.push(row.clone());
                    written += 1;
                }
            }
        }
        Ok(written)
    }

    async fn insert(&self, table: LedgerTable, rows: &[LedgerRow]) -> Result<u64, LedgerError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.lock();
        Self::check(&inner, LedgerOp::Insert, table)?;

        let stored = inner.tables.entry(table).or_default();
        let mut seen: HashSet<&str> = stored.iter().map(|r| r.id.as_str()).collect();
        for row in rows {
            if !seen.insert(row.id.as_str()) {
                return Err(LedgerError::Conflict(format!(
                    "duplicate key value violates unique constraint \"{}_pkey\"",
                    table.name()
                )));
            }
        }
        stored.extend(rows.iter().cloned());
        Ok(rows.len() as u64)
    }

    async fn delete(&self, table: LedgerTable, id: &str, owner: &str) -> Result<bool, LedgerError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.lock();
        Self::check(&inner, LedgerOp::Delete, table)?;

        let stored = inner.tables.entry(table).or_default();
        let before = stored.len();
        stored.retain(|r| !(r.id == id && r.user_id == owner));
        Ok(stored.len() < before)
    }

    async fn select(
        &self,
        table: LedgerTable,
        owner: &str,
        order: RowOrder,
    ) -> Result<Vec<LedgerRow>, LedgerError> {
        let inner = self.lock();
        Self::check(&inner, LedgerOp::Select, table)?;

        let mut rows: Vec<LedgerRow> = inner
            .tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| r.user_id == owner).cloned().collect())
            .unwrap_or_default();
        if order == RowOrder::NewestFirst {
            match table {
                LedgerTable::ItemRecords => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
                LedgerTable::RecycleBin => rows.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at)),
            }
        }
        Ok(rows)
    }

    async fn count(&self, table: LedgerTable, owner: &str) -> Result<u64, LedgerError> {
        let inner = self.lock();
        Self::check(&inner, LedgerOp::Count, table)?;

        let n = inner
            .tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| r.user_id == owner).count())
            .unwrap_or(0);
        Ok(n as u64)
    }
}
