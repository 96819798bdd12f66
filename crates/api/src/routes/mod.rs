pub mod bin;
pub mod data;
pub mod health;
pub mod intents;
pub mod items;
pub mod sync;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /items                      list (?q=), create
/// /items/statistics           collection statistics
/// /items/{id}                 move to recycle bin (DELETE, ?reason=)
/// /items/{id}/tags            append tag (POST)
///
/// /bin                        list, clear (DELETE)
/// /bin/{id}                   purge (DELETE)
/// /bin/{id}/restore           restore (POST)
///
/// /intents                    apply a classified intent (POST)
///
/// /sync/push                  push local to cloud (POST, signed-in owner)
/// /sync/pull                  replace local with cloud (POST, signed-in owner)
/// /sync/merge                 exchange one-sided records (POST, signed-in owner)
/// /sync/status                local and cloud counts (GET, ?cached=true)
///
/// /data                       clear all local data (DELETE)
/// /data/export                download backup (GET)
/// /data/import                restore backup (POST)
/// /data/info                  storage info (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/items", items::router())
        .nest("/bin", bin::router())
        .nest("/intents", intents::router())
        .nest("/sync", sync::router())
        .nest("/data", data::router())
}
