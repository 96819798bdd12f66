use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use itemkeeper_store::RecordStore;
use itemkeeper_sync::{Reconciler, RemoteLedger, StatusRefresher, SyncGateway};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::mirror::{self, MirrorBatch};

/// Everything that talks to the cloud ledger. Absent when sync is not
/// configured.
pub struct SyncServices {
    pub reconciler: Reconciler,
    pub refresher: Arc<StatusRefresher>,
    /// Queue of the single mirror worker. Closed when the last clone of the
    /// owning `AppState` is dropped.
    pub mirror_tx: mpsc::UnboundedSender<MirrorBatch>,
    mirror_worker: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SyncServices {
    /// Build the sync services and spawn the mirror worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(ledger: Arc<dyn RemoteLedger>, store: RecordStore, refresh_delay: Duration) -> Self {
        let reconciler = Reconciler::new(Arc::clone(&ledger), store);
        let refresher = Arc::new(StatusRefresher::new(reconciler.clone(), refresh_delay));
        let (mirror_tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(mirror::run(
            rx,
            SyncGateway::new(ledger),
            Arc::clone(&refresher),
        ));
        Self {
            reconciler,
            refresher,
            mirror_tx,
            mirror_worker: std::sync::Mutex::new(Some(worker)),
        }
    }

    /// Take the mirror worker's handle so shutdown can wait for the queue to
    /// drain. Returns `None` after the first call.
    pub fn take_mirror_worker(&self) -> Option<JoinHandle<()>> {
        self.mirror_worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Local active collection and recycle bin.
    pub store: RecordStore,
    /// Cloud sync services, `None` when `DATABASE_URL` is unset.
    pub sync: Option<Arc<SyncServices>>,
    /// Held across every read-modify-write of the local collections.
    pub local_lock: Arc<Mutex<()>>,
    sync_busy: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        store: RecordStore,
        ledger: Option<Arc<dyn RemoteLedger>>,
    ) -> Self {
        let delay = Duration::from_millis(config.status_refresh_delay_ms);
        let sync = ledger.map(|l| Arc::new(SyncServices::new(l, store.clone(), delay)));
        Self {
            config: Arc::new(config),
            store,
            sync,
            local_lock: Arc::new(Mutex::new(())),
            sync_busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The sync services, or [`AppError::SyncDisabled`].
    pub fn sync_services(&self) -> AppResult<&Arc<SyncServices>> {
        self.sync.as_ref().ok_or(AppError::SyncDisabled)
    }

    /// Claim the single bulk-sync slot, or [`AppError::SyncBusy`] if another
    /// push, pull or merge holds it. Released when the guard drops.
    pub fn begin_sync(&self) -> AppResult<SyncGuard> {
        self.sync_busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::SyncBusy)?;
        Ok(SyncGuard(Arc::clone(&self.sync_busy)))
    }
}

/// Releases the bulk-sync slot on drop.
pub struct SyncGuard(Arc<AtomicBool>);

impl Drop for SyncGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
