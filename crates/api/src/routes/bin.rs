//! Route definitions for the `/bin` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::bin;
use crate::state::AppState;

/// Routes mounted at `/bin`.
///
/// ```text
/// GET    /               -> list_bin
/// DELETE /               -> clear
/// DELETE /{id}           -> purge_one
/// POST   /{id}/restore   -> restore
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(bin::list_bin).delete(bin::clear))
        .route("/{id}", delete(bin::purge_one))
        .route("/{id}/restore", post(bin::restore))
}
