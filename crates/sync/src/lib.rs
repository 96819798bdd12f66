//! Local/cloud reconciliation for ItemKeeper.
//!
//! [`Reconciler`] runs the bulk push, pull and merge operations,
//! [`SyncGateway`] mirrors single mutations, and [`StatusRefresher`]
//! debounces status snapshots. All of them talk to the cloud through the
//! [`RemoteLedger`] trait.

pub mod debounce;
pub mod gateway;
pub mod ledger;
pub mod mapping;
pub mod memory;
pub mod outcome;
pub mod pg;
pub mod reconciler;
pub mod status;

pub use debounce::StatusRefresher;
pub use gateway::SyncGateway;
pub use ledger::{LedgerError, RemoteLedger, RowOrder};
pub use memory::{LedgerOp, MemoryLedger};
pub use outcome::{SyncAction, SyncOutcome, SyncReport};
pub use pg::PgLedger;
pub use reconciler::Reconciler;
pub use status::SyncStatus;

pub use itemkeeper_db::models::ledger::{LedgerRow, LedgerTable};
