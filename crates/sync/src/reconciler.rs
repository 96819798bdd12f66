//! Bulk reconciliation between the local store and the remote ledger.
//!
//! Remote calls within one operation run sequentially, active table first.
//! Nothing here is atomic across tables and nothing serializes concurrent
//! calls; the caller is expected to run one operation at a time.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use itemkeeper_core::record::{ItemRecord, RecycleBinEntry};
use itemkeeper_db::models::ledger::{LedgerRow, LedgerTable};
use itemkeeper_store::RecordStore;

use crate::ledger::{LedgerError, RemoteLedger, RowOrder};
use crate::mapping;
use crate::outcome::{SyncAction, SyncOutcome};
use crate::status::SyncStatus;

/// Runs push, pull and merge for one owner at a time.
#[derive(Clone)]
pub struct Reconciler {
    ledger: Arc<dyn RemoteLedger>,
    store: RecordStore,
}

impl Reconciler {
    pub fn new(ledger: Arc<dyn RemoteLedger>, store: RecordStore) -> Self {
        Self { ledger, store }
    }

    pub fn ledger(&self) -> &Arc<dyn RemoteLedger> {
        &self.ledger
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    // -- Push ---------------------------------------------------------------

    /// Upsert every local record and bin entry into the ledger.
    ///
    /// Local collections are never modified. Counts are rows the ledger
    /// actually wrote; rows whose id belongs to another owner are skipped.
    pub async fn push(&self, owner: &str) -> SyncOutcome {
        let now = Utc::now();
        let active: Vec<LedgerRow> = self
            .store
            .load_active()
            .iter()
            .map(|r| mapping::record_to_row(r, owner, now))
            .collect();
        let bin: Vec<LedgerRow> = self
            .store
            .load_bin()
            .iter()
            .map(|e| mapping::bin_entry_to_row(e, owner, now))
            .collect();

        let written_active = match self.upsert_batch(LedgerTable::ItemRecords, &active).await {
            Ok(n) => n,
            Err(e) => return self.fail(SyncAction::Push, owner, e),
        };
        let written_bin = match self.upsert_batch(LedgerTable::RecycleBin, &bin).await {
            Ok(n) => n,
            Err(e) => return self.fail(SyncAction::Push, owner, e),
        };

        let skipped = active.len() + bin.len() - written_active - written_bin;
        if skipped > 0 {
            tracing::warn!(owner = %owner, skipped, "Push skipped rows owned by another user");
        }

        self.store.mark_synced(now);
        tracing::info!(owner = %owner, active = written_active, bin = written_bin, "Push complete");
        SyncOutcome::Pushed {
            active: written_active,
            bin: written_bin,
        }
    }

    // -- Pull ---------------------------------------------------------------

    /// Replace both local collections with the owner's remote rows.
    ///
    /// Local-only records are lost. On a read failure nothing local changes.
    pub async fn pull(&self, owner: &str) -> SyncOutcome {
        let (active_rows, bin_rows) = match self.read_remote(owner, RowOrder::NewestFirst).await {
            Ok(rows) => rows,
            Err(e) => return self.fail(SyncAction::Pull, owner, e),
        };

        let active: Vec<ItemRecord> = active_rows.into_iter().map(mapping::row_to_record).collect();
        let bin: Vec<RecycleBinEntry> = bin_rows.into_iter().map(mapping::row_to_bin_entry).collect();

        if !self.store.save_active(&active) || !self.store.save_bin(&bin) {
            return self.fail(SyncAction::Pull, owner, "could not save to local storage");
        }

        self.store.mark_synced(Utc::now());
        tracing::info!(owner = %owner, active = active.len(), bin = bin.len(), "Pull complete");
        SyncOutcome::Pulled {
            active: active.len(),
            bin: bin.len(),
        }
    }

    // -- Merge --------------------------------------------------------------

    /// Exchange records that exist on only one side.
    ///
    /// Ids are compared per collection; records present on both sides are
    /// left as they are. Uploads use plain insert, so an id that appears
    /// remotely between the read and the write fails the merge. A failed
    /// local save after successful uploads does not roll the uploads back.
    pub async fn merge(&self, owner: &str) -> SyncOutcome {
        let mut local_active = self.store.load_active();
        let mut local_bin = self.store.load_bin();

        let (remote_active, remote_bin) = match self.read_remote(owner, RowOrder::Unordered).await {
            Ok(rows) => rows,
            Err(e) => return self.fail(SyncAction::Merge, owner, e),
        };

        let remote_active_ids: HashSet<&str> = remote_active.iter().map(|r| r.id.as_str()).collect();
        let remote_bin_ids: HashSet<&str> = remote_bin.iter().map(|r| r.id.as_str()).collect();
        let local_active_ids: HashSet<&str> = local_active.iter().map(|r| r.id.as_str()).collect();
        let local_bin_ids: HashSet<&str> = local_bin.iter().map(|e| e.id()).collect();

        let now = Utc::now();
        let upload_active: Vec<LedgerRow> = local_active
            .iter()
            .filter(|r| !remote_active_ids.contains(r.id.as_str()))
            .map(|r| mapping::record_to_row(r, owner, now))
            .collect();
        let upload_bin: Vec<LedgerRow> = local_bin
            .iter()
            .filter(|e| !remote_bin_ids.contains(e.id()))
            .map(|e| mapping::bin_entry_to_row(e, owner, now))
            .collect();
        let download_active: Vec<ItemRecord> = remote_active
            .iter()
            .filter(|r| !local_active_ids.contains(r.id.as_str()))
            .cloned()
            .map(mapping::row_to_record)
            .collect();
        let download_bin: Vec<RecycleBinEntry> = remote_bin
            .iter()
            .filter(|r| !local_bin_ids.contains(r.id.as_str()))
            .cloned()
            .map(mapping::row_to_bin_entry)
            .collect();

        if let Err(e) = self.insert_batch(LedgerTable::ItemRecords, &upload_active).await {
            return self.fail(SyncAction::Merge, owner, e);
        }
        if let Err(e) = self.insert_batch(LedgerTable::RecycleBin, &upload_bin).await {
            return self.fail(SyncAction::Merge, owner, e);
        }
        let uploaded = upload_active.len() + upload_bin.len();

        let downloaded = download_active.len() + download_bin.len();
        if !download_active.is_empty() {
            local_active.extend(download_active);
            if !self.store.save_active(&local_active) {
                return self.fail(SyncAction::Merge, owner, "could not save to local storage");
            }
        }
        if !download_bin.is_empty() {
            local_bin.extend(download_bin);
            if !self.store.save_bin(&local_bin) {
                return self.fail(SyncAction::Merge, owner, "could not save to local storage");
            }
        }

        self.store.mark_synced(now);
        tracing::info!(owner = %owner, uploaded, downloaded, "Merge complete");
        SyncOutcome::Merged {
            uploaded,
            downloaded,
        }
    }

    // -- Status -------------------------------------------------------------

    pub async fn status(&self, owner: &str) -> SyncStatus {
        SyncStatus::collect(self.ledger.as_ref(), &self.store, owner).await
    }

    // -- Helpers ------------------------------------------------------------

    async fn read_remote(
        &self,
        owner: &str,
        order: RowOrder,
    ) -> Result<(Vec<LedgerRow>, Vec<LedgerRow>), LedgerError> {
        let active = self.ledger.select(LedgerTable::ItemRecords, owner, order).await?;
        let bin = self.ledger.select(LedgerTable::RecycleBin, owner, order).await?;
        Ok((active, bin))
    }

    async fn upsert_batch(&self, table: LedgerTable, rows: &[LedgerRow]) -> Result<usize, LedgerError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let written = self.ledger.upsert(table, rows).await?;
        Ok(usize::try_from(written).unwrap_or(usize::MAX).min(rows.len()))
    }

    async fn insert_batch(&self, table: LedgerTable, rows: &[LedgerRow]) -> Result<(), LedgerError> {
        if !rows.is_empty() {
            self.ledger.insert(table, rows).await?;
        }
        Ok(())
    }

    fn fail(&self, action: SyncAction, owner: &str, reason: impl std::fmt::Display) -> SyncOutcome {
        tracing::error!(owner = %owner, %action, error = %reason, "Sync failed");
        SyncOutcome::failed(action, reason)
    }
}
