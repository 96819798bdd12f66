//! Read-only local and cloud counts.

use itemkeeper_core::types::Timestamp;
use itemkeeper_db::models::ledger::LedgerTable;
use itemkeeper_store::RecordStore;
use serde::Serialize;

use crate::ledger::{LedgerError, RemoteLedger};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub local_records: usize,
    pub local_recycle_bin: usize,
    pub cloud_records: u64,
    pub cloud_recycle_bin: u64,
    pub last_sync: Option<Timestamp>,
}

impl SyncStatus {
    /// Gather counts for `owner`.
    ///
    /// Never fails: any ledger error yields the all-zero status with no
    /// last-sync value.
    pub async fn collect(ledger: &dyn RemoteLedger, store: &RecordStore, owner: &str) -> Self {
        match Self::try_collect(ledger, store, owner).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(owner = %owner, error = %e, "Failed to read sync status");
                Self::default()
            }
        }
    }

    async fn try_collect(
        ledger: &dyn RemoteLedger,
        store: &RecordStore,
        owner: &str,
    ) -> Result<Self, LedgerError> {
        let cloud_records = ledger.count(LedgerTable::ItemRecords, owner).await?;
        let cloud_recycle_bin = ledger.count(LedgerTable::RecycleBin, owner).await?;
        Ok(Self {
            local_records: store.load_active().len(),
            local_recycle_bin: store.load_bin().len(),
            cloud_records,
            cloud_recycle_bin,
            last_sync: store.last_sync(),
        })
    }
}
