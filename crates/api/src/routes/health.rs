use axum::extract::State;
use axum::{routing::get, Json, Router};
use itemkeeper_sync::LedgerTable;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the local store accepts writes.
    pub storage_available: bool,
    /// Whether a cloud ledger is configured.
    pub cloud_sync_enabled: bool,
    /// Whether the cloud ledger answered. `None` when sync is disabled.
    pub cloud_healthy: Option<bool>,
}

/// GET /health -- returns local storage and cloud ledger health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage_available = state.store.storage_info().available;

    let cloud_healthy = match &state.sync {
        Some(services) => Some(
            services
                .reconciler
                .ledger()
                .count(LedgerTable::ItemRecords, "")
                .await
                .is_ok(),
        ),
        None => None,
    };

    let healthy = storage_available && cloud_healthy.unwrap_or(true);
    let status = if healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        storage_available,
        cloud_sync_enabled: state.sync.is_some(),
        cloud_healthy,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
