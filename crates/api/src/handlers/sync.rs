//! Handlers for `/sync`: bulk push, pull, merge and status.
//!
//! Transport outcomes are always 200 with `{success, message}`. Guests get
//! 401, a second concurrent bulk operation gets 409, and a daemon without a
//! cloud ledger answers 503.

use axum::extract::{Query, State};
use axum::Json;
use itemkeeper_sync::{SyncAction, SyncReport, SyncStatus};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::session::RequireOwner;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub cached: bool,
}

/// POST /api/v1/sync/push
pub async fn push(
    State(state): State<AppState>,
    RequireOwner(session): RequireOwner,
) -> AppResult<Json<DataResponse<SyncReport>>> {
    run(&state, &session.owner_id, SyncAction::Push).await
}

/// POST /api/v1/sync/pull
///
/// Replaces the local collections with the cloud copy.
pub async fn pull(
    State(state): State<AppState>,
    RequireOwner(session): RequireOwner,
) -> AppResult<Json<DataResponse<SyncReport>>> {
    run(&state, &session.owner_id, SyncAction::Pull).await
}

/// POST /api/v1/sync/merge
pub async fn merge(
    State(state): State<AppState>,
    RequireOwner(session): RequireOwner,
) -> AppResult<Json<DataResponse<SyncReport>>> {
    run(&state, &session.owner_id, SyncAction::Merge).await
}

/// GET /api/v1/sync/status
///
/// With `?cached=true`, returns the last debounced snapshot when one exists.
pub async fn status(
    State(state): State<AppState>,
    RequireOwner(session): RequireOwner,
    Query(params): Query<StatusQuery>,
) -> AppResult<Json<DataResponse<SyncStatus>>> {
    let services = state.sync_services()?;
    if params.cached {
        if let Some(status) = services.refresher.latest(&session.owner_id).await {
            return Ok(Json(DataResponse { data: status }));
        }
    }
    let status = services.refresher.refresh_now(&session.owner_id).await;
    Ok(Json(DataResponse { data: status }))
}

async fn run(
    state: &AppState,
    owner: &str,
    action: SyncAction,
) -> AppResult<Json<DataResponse<SyncReport>>> {
    let services = state.sync_services()?;
    let _busy = state.begin_sync()?;

    tracing::info!(owner = %owner, %action, "Sync started");
    let outcome = {
        let _guard = state.local_lock.lock().await;
        match action {
            SyncAction::Push => services.reconciler.push(owner).await,
            SyncAction::Pull => services.reconciler.pull(owner).await,
            SyncAction::Merge => services.reconciler.merge(owner).await,
        }
    };
    services.refresher.schedule(owner);

    Ok(Json(DataResponse {
        data: SyncReport::from(&outcome),
    }))
}
