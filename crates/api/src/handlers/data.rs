//! Handlers for `/data`: backup, restore from backup, storage info and
//! wiping local data. None of these touch the cloud ledger.

use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use itemkeeper_store::{ImportSummary, StorageInfo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    #[serde(flatten)]
    pub summary: ImportSummary,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StorageInfoResponse {
    #[serde(flatten)]
    pub info: StorageInfo,
    pub size_label: String,
}

/// GET /api/v1/data/export
///
/// Download both collections as a dated JSON backup file.
pub async fn export(State(state): State<AppState>) -> AppResult<Response> {
    let now = Utc::now();
    let body = state.store.export_json(now)?;
    let filename = format!("item-keeper-backup-{}.json", now.format("%Y-%m-%d"));
    Ok((
        [
            (CONTENT_TYPE, "application/json".to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        body,
    )
        .into_response())
}

/// POST /api/v1/data/import
///
/// Replace both collections from a backup. The body is the raw export
/// document; a malformed document writes nothing.
pub async fn import(
    State(state): State<AppState>,
    body: String,
) -> AppResult<Json<DataResponse<ImportResponse>>> {
    let summary = {
        let _guard = state.local_lock.lock().await;
        state.store.import_json(&body)?
    };
    tracing::info!(records = summary.records, recycle_bin = summary.recycle_bin, "Backup imported");
    Ok(Json(DataResponse {
        data: ImportResponse {
            message: summary.message(),
            summary,
        },
    }))
}

/// GET /api/v1/data/info
pub async fn info(State(state): State<AppState>) -> AppResult<Json<DataResponse<StorageInfoResponse>>> {
    let info = state.store.storage_info();
    Ok(Json(DataResponse {
        data: StorageInfoResponse {
            size_label: info.size_label(),
            info,
        },
    }))
}

/// DELETE /api/v1/data
pub async fn clear_all(State(state): State<AppState>) -> AppResult<Json<DataResponse<MessageResponse>>> {
    let cleared = {
        let _guard = state.local_lock.lock().await;
        state.store.clear_all()
    };
    if !cleared {
        return Err(AppError::InternalError("Failed to clear local data".into()));
    }
    tracing::warn!("All local data cleared");
    Ok(Json(DataResponse {
        data: MessageResponse {
            message: "All local data cleared".to_string(),
        },
    }))
}
