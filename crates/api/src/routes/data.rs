//! Route definitions for `/data`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::data;
use crate::state::AppState;

/// Routes mounted at `/data`.
///
/// ```text
/// DELETE /          -> clear_all
/// GET    /export    -> export
/// POST   /import    -> import
/// GET    /info      -> info
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", delete(data::clear_all))
        .route("/export", get(data::export))
        .route("/import", post(data::import))
        .route("/info", get(data::info))
}
