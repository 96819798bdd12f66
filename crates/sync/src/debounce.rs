//! Debounced sync-status refresh.
//!
//! One pending-timer slot: each [`StatusRefresher::schedule`] aborts the
//! pending task (timer or in-flight refresh) and starts a new one, so a
//! burst of mutations produces a single refresh once the burst settles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use itemkeeper_core::types::OwnerId;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::reconciler::Reconciler;
use crate::status::SyncStatus;

/// Default delay between the last mutation and the refresh.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(1000);

type Snapshot = Arc<RwLock<Option<(OwnerId, SyncStatus)>>>;

pub struct StatusRefresher {
    reconciler: Reconciler,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    latest: Snapshot,
    completed: Arc<AtomicUsize>,
}

impl StatusRefresher {
    pub fn new(reconciler: Reconciler, delay: Duration) -> Self {
        Self {
            reconciler,
            delay,
            pending: Mutex::new(None),
            latest: Arc::new(RwLock::new(None)),
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancel any pending refresh and schedule a new one for `owner`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, owner: &str) {
        let reconciler = self.reconciler.clone();
        let latest = Arc::clone(&self.latest);
        let completed = Arc::clone(&self.completed);
        let delay = self.delay;
        let owner = owner.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let status = reconciler.status(&owner).await;
            tracing::debug!(owner = %owner, ?status, "Sync status refreshed");
            *latest.write().await = Some((owner, status));
            completed.fetch_add(1, Ordering::SeqCst);
        });

        let mut slot = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Cancel any pending refresh and refresh immediately.
    pub async fn refresh_now(&self, owner: &str) -> SyncStatus {
        self.cancel();
        let status = self.reconciler.status(owner).await;
        *self.latest.write().await = Some((owner.to_string(), status.clone()));
        self.completed.fetch_add(1, Ordering::SeqCst);
        status
    }

    /// Last snapshot taken for `owner`, if any.
    pub async fn latest(&self, owner: &str) -> Option<SyncStatus> {
        match &*self.latest.read().await {
            Some((cached_owner, status)) if cached_owner == owner => Some(status.clone()),
            _ => None,
        }
    }

    /// Whether a refresh is scheduled or running.
    pub fn is_pending(&self) -> bool {
        let slot = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Number of refreshes that ran to completion.
    pub fn completed_refreshes(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        let mut slot = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

impl Drop for StatusRefresher {
    fn drop(&mut self) {
        self.cancel();
    }
}
