//! Handlers for the `/bin` resource (the recycle bin).
//!
//! Restoring moves an entry back to the active collection without its
//! deletion metadata. Purging is permanent.

use axum::extract::{Path, State};
use axum::Json;
use itemkeeper_core::collection;
use itemkeeper_core::record::{ItemRecord, RecycleBinEntry};
use serde::Serialize;

use super::{save_bin, save_restored};
use crate::error::AppResult;
use crate::middleware::session::Session;
use crate::mirror::{mirror, MirrorOp};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClearBinResponse {
    pub removed: usize,
    pub message: String,
}

/// GET /api/v1/bin
pub async fn list_bin(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<RecycleBinEntry>>>> {
    Ok(Json(DataResponse {
        data: state.store.load_bin(),
    }))
}

/// POST /api/v1/bin/{id}/restore
///
/// Returns 404 if the entry is not in the bin and 409 if a record with the
/// same id is already active.
pub async fn restore(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<ItemRecord>>> {
    let record = {
        let _guard = state.local_lock.lock().await;
        let mut records = state.store.load_active();
        let mut bin = state.store.load_bin();
        let records_before = records.clone();
        let record = collection::restore(&mut records, &mut bin, &id)?;
        save_restored(&state.store, &records, &bin, &records_before)?;
        mirror(
            &state,
            &session.owner_id,
            vec![
                MirrorOp::DeleteBinEntry(record.id.clone()),
                MirrorOp::Record(record.clone()),
            ],
        );
        record
    };

    tracing::info!(id = %record.id, "Item restored from recycle bin");
    Ok(Json(DataResponse { data: record }))
}

/// DELETE /api/v1/bin/{id}
pub async fn purge_one(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<RecycleBinEntry>>> {
    let entry = {
        let _guard = state.local_lock.lock().await;
        let mut bin = state.store.load_bin();
        let entry = collection::purge(&mut bin, &id)?;
        save_bin(&state.store, &bin)?;
        mirror(
            &state,
            &session.owner_id,
            vec![MirrorOp::DeleteBinEntry(entry.id().to_string())],
        );
        entry
    };

    tracing::info!(id = %entry.id(), "Recycle bin entry purged");
    Ok(Json(DataResponse { data: entry }))
}

/// DELETE /api/v1/bin
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<DataResponse<ClearBinResponse>>> {
    let removed = {
        let _guard = state.local_lock.lock().await;
        let mut bin = state.store.load_bin();
        let removed = collection::clear_bin(&mut bin);
        save_bin(&state.store, &bin)?;
        let ops = removed
            .iter()
            .map(|e| MirrorOp::DeleteBinEntry(e.id().to_string()))
            .collect();
        mirror(&state, &session.owner_id, ops);
        removed
    };

    tracing::info!(count = removed.len(), "Recycle bin cleared");

    Ok(Json(DataResponse {
        data: ClearBinResponse {
            removed: removed.len(),
            message: format!("Recycle bin cleared ({} entries)", removed.len()),
        },
    }))
}
