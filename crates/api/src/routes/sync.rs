//! Route definitions for `/sync`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sync;
use crate::state::AppState;

/// Routes mounted at `/sync`.
///
/// ```text
/// POST /push     -> push
/// POST /pull     -> pull
/// POST /merge    -> merge
/// GET  /status   -> status (?cached=true)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/push", post(sync::push))
        .route("/pull", post(sync::pull))
        .route("/merge", post(sync::merge))
        .route("/status", get(sync::status))
}
