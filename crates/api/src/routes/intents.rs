use axum::routing::post;
use axum::Router;

use crate::handlers::intents;
use crate::state::AppState;

/// Routes mounted at `/intents`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(intents::apply))
}
