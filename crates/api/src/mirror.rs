//! Mirroring of committed local mutations to the cloud.
//!
//! Handlers queue ops while still holding the local lock; a single worker
//! replays them in queue order, so the ledger sees changes in the order they
//! were committed locally.

use std::sync::Arc;

use itemkeeper_core::record::{ItemRecord, RecycleBinEntry};
use itemkeeper_core::types::{is_guest, OwnerId, RecordId};
use itemkeeper_sync::{StatusRefresher, SyncGateway};
use tokio::sync::mpsc;

use crate::state::AppState;

/// One single-row change to replay against the ledger.
#[derive(Debug, Clone)]
pub enum MirrorOp {
    Record(ItemRecord),
    BinEntry(RecycleBinEntry),
    DeleteRecord(RecordId),
    DeleteBinEntry(RecordId),
}

/// Ops committed by one local mutation, for one owner.
pub type MirrorBatch = (OwnerId, Vec<MirrorOp>);

/// Queue `ops` for the mirror worker.
///
/// Returns `false` without queueing anything for guests, when sync is not
/// configured, or when there is nothing to send. Call this before releasing
/// the local lock.
pub fn mirror(state: &AppState, owner: &str, ops: Vec<MirrorOp>) -> bool {
    if ops.is_empty() || is_guest(owner) {
        return false;
    }
    let Some(services) = &state.sync else {
        return false;
    };
    if services.mirror_tx.send((owner.to_string(), ops)).is_err() {
        tracing::warn!(owner = %owner, "Mirror worker has stopped, change not sent to the cloud");
        return false;
    }
    true
}

/// Replay queued batches until every sender is dropped.
///
/// Failures are logged by the gateway and never stop the worker. Each batch
/// is followed by a debounced status refresh.
pub async fn run(
    mut rx: mpsc::UnboundedReceiver<MirrorBatch>,
    gateway: SyncGateway,
    refresher: Arc<StatusRefresher>,
) {
    tracing::info!("Mirror worker started");

    while let Some((owner, ops)) = rx.recv().await {
        let total = ops.len();
        let mut failed = 0usize;
        for op in &ops {
            let ok = match op {
                MirrorOp::Record(r) => gateway.sync_record(r, &owner).await,
                MirrorOp::BinEntry(e) => gateway.sync_bin_entry(e, &owner).await,
                MirrorOp::DeleteRecord(id) => gateway.delete_record(id, &owner).await,
                MirrorOp::DeleteBinEntry(id) => gateway.delete_bin_entry(id, &owner).await,
            };
            if !ok {
                failed += 1;
            }
        }
        if failed > 0 {
            tracing::warn!(owner = %owner, failed, total, "Some changes were not mirrored to the cloud");
        } else {
            tracing::debug!(owner = %owner, total, "Mirrored changes to the cloud");
        }
        refresher.schedule(&owner);
    }

    tracing::info!("Mirror worker stopped");
}
