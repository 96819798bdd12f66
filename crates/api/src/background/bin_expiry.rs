//! Periodic removal of expired recycle-bin entries.
//!
//! Entries deleted more than the retention period ago are dropped from the
//! local bin. The sweep is local-only: cloud bin rows are left alone and
//! come back on the next pull or merge.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use itemkeeper_core::collection;
use itemkeeper_core::types::Timestamp;
use itemkeeper_store::RecordStore;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Remove entries deleted at or before `now - retention_days`.
///
/// Returns the number of entries removed. Nothing is written when nothing
/// expired.
pub async fn sweep_once(
    store: &RecordStore,
    lock: &Mutex<()>,
    now: Timestamp,
    retention_days: i64,
) -> usize {
    let _guard = lock.lock().await;
    let mut bin = store.load_bin();
    let retention = chrono::Duration::days(retention_days);
    let expired = collection::sweep_expired(&mut bin, now, retention);
    if expired.is_empty() {
        return 0;
    }
    if !store.save_bin(&bin) {
        tracing::error!(expired = expired.len(), "Recycle bin sweep: failed to save");
        return 0;
    }
    expired.len()
}

/// Run the sweep loop until `cancel` is triggered. The first sweep runs
/// immediately.
pub async fn run(
    store: RecordStore,
    lock: Arc<Mutex<()>>,
    retention_days: i64,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        retention_days,
        interval_secs = interval.as_secs(),
        "Recycle bin sweep started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Recycle bin sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                let removed = sweep_once(&store, &lock, Utc::now(), retention_days).await;
                if removed > 0 {
                    tracing::info!(removed, "Recycle bin sweep: removed expired entries");
                } else {
                    tracing::debug!("Recycle bin sweep: nothing expired");
                }
            }
        }
    }
}
