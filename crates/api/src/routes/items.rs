//! Route definitions for the `/items` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::items;
use crate::state::AppState;

/// Routes mounted at `/items`.
///
/// ```text
/// GET    /              -> list_items (?q=)
/// POST   /              -> create_item
/// GET    /statistics    -> statistics
/// DELETE /{id}          -> delete_item (?reason=)
/// POST   /{id}/tags     -> add_tag
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(items::list_items).post(items::create_item))
        .route("/statistics", get(items::statistics))
        .route("/{id}", delete(items::delete_item))
        .route("/{id}/tags", post(items::add_tag))
}
