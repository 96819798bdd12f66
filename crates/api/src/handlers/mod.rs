pub mod bin;
pub mod data;
pub mod intents;
pub mod items;
pub mod sync;

use itemkeeper_core::record::{ItemRecord, RecycleBinEntry};
use itemkeeper_store::RecordStore;

use crate::error::{AppError, AppResult};

/// Write the active collection back, mapping a failed save to 500.
fn save_active(store: &RecordStore, records: &[ItemRecord]) -> AppResult<()> {
    if store.save_active(records) {
        Ok(())
    } else {
        Err(AppError::InternalError("Failed to save records".into()))
    }
}

fn save_bin(store: &RecordStore, entries: &[RecycleBinEntry]) -> AppResult<()> {
    if store.save_bin(entries) {
        Ok(())
    } else {
        Err(AppError::InternalError("Failed to save recycle bin".into()))
    }
}

/// Persist records moved out of the active collection: bin first, then
/// active. If the active save fails the bin is written back to `bin_before`
/// so no record is left in both collections.
fn save_moved_to_bin(
    store: &RecordStore,
    records: &[ItemRecord],
    bin: &[RecycleBinEntry],
    bin_before: &[RecycleBinEntry],
) -> AppResult<()> {
    save_bin(store, bin)?;
    if let Err(e) = save_active(store, records) {
        if !store.save_bin(bin_before) {
            tracing::error!("Failed to roll back recycle bin after a failed records save");
        }
        return Err(e);
    }
    Ok(())
}

/// Persist a restore: active first, then bin. If the bin save fails the
/// active collection is written back to `records_before`.
fn save_restored(
    store: &RecordStore,
    records: &[ItemRecord],
    bin: &[RecycleBinEntry],
    records_before: &[ItemRecord],
) -> AppResult<()> {
    save_active(store, records)?;
    if let Err(e) = save_bin(store, bin) {
        if !store.save_active(records_before) {
            tracing::error!("Failed to roll back records after a failed recycle bin save");
        }
        return Err(e);
    }
    Ok(())
}
