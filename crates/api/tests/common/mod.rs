#![allow(dead_code)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use itemkeeper_store::{KeyValueStore, MemoryKv, RecordStore};
use itemkeeper_sync::{MemoryLedger, RemoteLedger};
use serde_json::Value;
use tower::ServiceExt;

use itemkeeper_api::config::ServerConfig;
use itemkeeper_api::router::build_app_router;
use itemkeeper_api::state::AppState;

/// Owner id used by signed-in requests.
pub const OWNER: &str = "u1";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a short status-refresh delay so debounced refreshes settle quickly.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        data_dir: PathBuf::from("./data"),
        database_url: None,
        bin_retention_days: 30,
        bin_sweep_interval_secs: 86_400,
        status_refresh_delay_ms: 10,
    }
}

/// Everything a test needs to drive the router and inspect side effects.
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub kv: Arc<MemoryKv>,
    pub ledger: Option<Arc<MemoryLedger>>,
}

/// Build the full application router over an in-memory store.
///
/// Cloud sync is enabled only when a ledger is supplied. The router is the
/// same one `main.rs` serves, so the full middleware stack is exercised.
pub fn build_test_app(ledger: Option<Arc<MemoryLedger>>) -> TestApp {
    let kv = Arc::new(MemoryKv::new());
    let store = RecordStore::new(kv.clone());
    let remote = ledger
        .clone()
        .map(|l| -> Arc<dyn RemoteLedger> { l });
    let state = AppState::new(test_config(), store, remote);
    TestApp {
        app: build_app_router(state.clone()),
        state,
        kv,
        ledger,
    }
}

/// Build an app with a fresh in-memory ledger attached.
pub fn build_synced_app() -> TestApp {
    build_test_app(Some(Arc::new(MemoryLedger::new())))
}

impl TestApp {
    pub fn ledger(&self) -> &MemoryLedger {
        self.ledger.as_deref().expect("test app has no ledger")
    }
}

/// Build the router over any key-value backend and optional ledger.
pub fn build_app_over(
    kv: Arc<dyn KeyValueStore>,
    ledger: Option<Arc<dyn RemoteLedger>>,
) -> (Router, AppState) {
    let state = AppState::new(test_config(), RecordStore::new(kv), ledger);
    (build_app_router(state.clone()), state)
}

/// Memory store whose writes to selected keys fail.
#[derive(Default)]
pub struct SelectiveKv {
    inner: MemoryKv,
    failing: Mutex<HashSet<String>>,
}

impl SelectiveKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes_to(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    fn fails(&self, key: &str) -> bool {
        self.failing.lock().unwrap().contains(key)
    }
}

impl KeyValueStore for SelectiveKv {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> bool {
        !self.fails(key) && self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> bool {
        !self.fails(key) && self.inner.remove(key)
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

fn builder(method: &str, uri: &str, owner: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match owner {
        Some(owner) => builder.header("x-owner-id", owner),
        None => builder,
    }
}

/// GET as the guest.
pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, builder("GET", uri, None).body(Body::empty()).unwrap()).await
}

/// GET as `owner`.
pub async fn get_as(app: &Router, uri: &str, owner: &str) -> Response<Body> {
    send(app, builder("GET", uri, Some(owner)).body(Body::empty()).unwrap()).await
}

/// POST a JSON body as the guest.
pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    post_json_with(app, uri, body, None).await
}

/// POST a JSON body as `owner`.
pub async fn post_json_as(app: &Router, uri: &str, body: Value, owner: &str) -> Response<Body> {
    post_json_with(app, uri, body, Some(owner)).await
}

async fn post_json_with(app: &Router, uri: &str, body: Value, owner: Option<&str>) -> Response<Body> {
    let request = builder("POST", uri, owner)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST with an empty body as `owner`, or as the guest when `None`.
pub async fn post_empty(app: &Router, uri: &str, owner: Option<&str>) -> Response<Body> {
    send(app, builder("POST", uri, owner).body(Body::empty()).unwrap()).await
}

/// DELETE as the guest.
pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    send(app, builder("DELETE", uri, None).body(Body::empty()).unwrap()).await
}

/// DELETE as `owner`.
pub async fn delete_as(app: &Router, uri: &str, owner: &str) -> Response<Body> {
    send(app, builder("DELETE", uri, Some(owner)).body(Body::empty()).unwrap()).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Create a record through the API and return its JSON.
pub async fn create_item(app: &Router, item: &str, location: &str, owner: Option<&str>) -> Value {
    let body = serde_json::json!({ "item": item, "location": location });
    let response = post_json_with(app, "/api/v1/items", body, owner).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// Poll `cond` until it holds, failing the test after two seconds.
pub async fn wait_for(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 2s");
}
