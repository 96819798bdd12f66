//! Single-row mirroring of local mutations.
//!
//! Every call returns `true` on success and `false` on any failure, which is
//! logged and otherwise swallowed. Drift caused by a failed call is repaired
//! by the next merge.

use std::sync::Arc;

use chrono::Utc;
use itemkeeper_core::record::{ItemRecord, RecycleBinEntry};
use itemkeeper_db::models::ledger::LedgerTable;

use crate::ledger::RemoteLedger;
use crate::mapping;

#[derive(Clone)]
pub struct SyncGateway {
    ledger: Arc<dyn RemoteLedger>,
}

impl SyncGateway {
    pub fn new(ledger: Arc<dyn RemoteLedger>) -> Self {
        Self { ledger }
    }

    pub async fn sync_record(&self, record: &ItemRecord, owner: &str) -> bool {
        let row = mapping::record_to_row(record, owner, Utc::now());
        match self.ledger.upsert(LedgerTable::ItemRecords, &[row]).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(id = %record.id, owner = %owner, error = %e, "Failed to sync record");
                false
            }
        }
    }

    pub async fn sync_bin_entry(&self, entry: &RecycleBinEntry, owner: &str) -> bool {
        let row = mapping::bin_entry_to_row(entry, owner, Utc::now());
        match self.ledger.upsert(LedgerTable::RecycleBin, &[row]).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(id = %entry.id(), owner = %owner, error = %e, "Failed to sync recycle bin entry");
                false
            }
        }
    }

    pub async fn delete_record(&self, id: &str, owner: &str) -> bool {
        self.delete(LedgerTable::ItemRecords, id, owner).await
    }

    pub async fn delete_bin_entry(&self, id: &str, owner: &str) -> bool {
        self.delete(LedgerTable::RecycleBin, id, owner).await
    }

    /// A delete that matches no row still counts as success.
    async fn delete(&self, table: LedgerTable, id: &str, owner: &str) -> bool {
        match self.ledger.delete(table, id, owner).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(table = table.name(), id = %id, owner = %owner, error = %e, "Failed to delete cloud row");
                false
            }
        }
    }
}
