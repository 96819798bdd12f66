//! Handlers for the `/items` resource (the active collection).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use itemkeeper_core::collection::{self, Statistics};
use itemkeeper_core::error::CoreError;
use itemkeeper_core::record::{ItemRecord, RecycleBinEntry, Source};
use serde::Deserialize;

use super::{save_active, save_moved_to_bin};
use crate::error::AppResult;
use crate::middleware::session::Session;
use crate::mirror::{mirror, MirrorOp};
use crate::response::DataResponse;
use crate::state::AppState;

/// Reason stored on entries deleted through `DELETE /items/{id}`.
pub const DEFAULT_DELETE_REASON: &str = "Deleted manually";

#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub item: String,
    pub location: String,
    #[serde(default)]
    pub raw_input: String,
    #[serde(default)]
    pub source: Source,
}

#[derive(Debug, Deserialize)]
pub struct AddTagRequest {
    pub tag: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteItemQuery {
    pub reason: Option<String>,
}

/// GET /api/v1/items
///
/// List the active collection, optionally filtered by `?q=`.
pub async fn list_items(
    State(state): State<AppState>,
    Query(params): Query<ListItemsQuery>,
) -> AppResult<Json<DataResponse<Vec<ItemRecord>>>> {
    let records = state.store.load_active();
    let data = match params.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => collection::search(&records, q).into_iter().cloned().collect(),
        _ => records,
    };
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/items
pub async fn create_item(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<CreateItemRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ItemRecord>>)> {
    let record = {
        let _guard = state.local_lock.lock().await;
        let mut records = state.store.load_active();
        let record = collection::create_record(
            &session.owner_id,
            &input.item,
            &input.location,
            &input.raw_input,
            input.source,
            Utc::now(),
        )?;
        records.push(record.clone());
        save_active(&state.store, &records)?;
        mirror(&state, &session.owner_id, vec![MirrorOp::Record(record.clone())]);
        record
    };

    tracing::info!(id = %record.id, owner = %session.owner_id, "Item recorded");
    Ok((StatusCode::CREATED, Json(DataResponse { data: record })))
}

/// POST /api/v1/items/{id}/tags
///
/// Append a tag. Adding a tag the record already has is a no-op.
pub async fn add_tag(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(input): Json<AddTagRequest>,
) -> AppResult<Json<DataResponse<ItemRecord>>> {
    let record = {
        let _guard = state.local_lock.lock().await;
        let mut records = state.store.load_active();
        let changed = collection::tag_record(&mut records, &id, &input.tag)?;
        if changed {
            save_active(&state.store, &records)?;
        }
        let record = records
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "ItemRecord",
                id: id.clone(),
            })?;
        if changed {
            mirror(&state, &session.owner_id, vec![MirrorOp::Record(record.clone())]);
        }
        record
    };

    Ok(Json(DataResponse { data: record }))
}

/// DELETE /api/v1/items/{id}
///
/// Move one record to the recycle bin.
pub async fn delete_item(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Query(params): Query<DeleteItemQuery>,
) -> AppResult<Json<DataResponse<RecycleBinEntry>>> {
    let reason = params
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_DELETE_REASON)
        .to_string();

    let entry = {
        let _guard = state.local_lock.lock().await;
        let mut records = state.store.load_active();
        let mut bin = state.store.load_bin();
        let bin_before = bin.clone();
        let moved = collection::move_to_bin(&mut records, &mut bin, &[id.clone()], &reason, Utc::now());
        let Some(entry) = moved.into_iter().next() else {
            return Err(CoreError::NotFound {
                entity: "ItemRecord",
                id,
            }
            .into());
        };
        save_moved_to_bin(&state.store, &records, &bin, &bin_before)?;
        mirror(
            &state,
            &session.owner_id,
            vec![
                MirrorOp::DeleteRecord(entry.id().to_string()),
                MirrorOp::BinEntry(entry.clone()),
            ],
        );
        entry
    };

    tracing::info!(id = %entry.id(), reason = %reason, "Item moved to recycle bin");
    Ok(Json(DataResponse { data: entry }))
}

/// GET /api/v1/items/statistics
pub async fn statistics(State(state): State<AppState>) -> AppResult<Json<DataResponse<Statistics>>> {
    let records = state.store.load_active();
    Ok(Json(DataResponse {
        data: collection::statistics(&records),
    }))
}
