//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, build_app_over, build_synced_app, build_test_app, get, send};
use itemkeeper_store::{KeyValueStore, MemoryKv};
use itemkeeper_sync::{LedgerOp, LedgerTable, MemoryLedger};

// ---------------------------------------------------------------------------
// Test: GET /health without cloud sync
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_without_cloud_sync() {
    let t = build_test_app(None);
    let response = get(&t.app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["storage_available"], true);
    assert_eq!(json["cloud_sync_enabled"], false);
    assert!(json["cloud_healthy"].is_null());
}

// ---------------------------------------------------------------------------
// Test: GET /health reports the ledger
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_with_reachable_ledger() {
    let t = build_synced_app();
    let json = body_json(get(&t.app, "/health").await).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["cloud_sync_enabled"], true);
    assert_eq!(json["cloud_healthy"], true);
}

#[tokio::test]
async fn health_check_degraded_when_ledger_fails() {
    let ledger = Arc::new(MemoryLedger::new());
    ledger.fail(LedgerOp::Count, LedgerTable::ItemRecords);
    let t = build_test_app(Some(ledger));

    let response = get(&t.app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["cloud_healthy"], false);
}

#[tokio::test]
async fn health_check_degraded_when_storage_unavailable() {
    let t = build_test_app(None);
    t.kv.set_available(false);

    let json = body_json(get(&t.app, "/health").await).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["storage_available"], false);
}

// ---------------------------------------------------------------------------
// Test: Unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let t = build_test_app(None);
    let response = get(&t.app, "/this-route-does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let t = build_test_app(None);
    let response = get(&t.app, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

// ---------------------------------------------------------------------------
// Test: CORS preflight allows the owner header
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cors_preflight_allows_owner_header() {
    let t = build_test_app(None);
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/sync/push")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "x-owner-id")
        .body(Body::empty())
        .unwrap();

    let response = send(&t.app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let allowed = response
        .headers()
        .get("access-control-allow-headers")
        .unwrap()
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed.contains("x-owner-id"));
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
}

// ---------------------------------------------------------------------------
// Test: a panicking handler becomes a JSON 500
// ---------------------------------------------------------------------------

/// Storage backend whose reads panic while armed.
struct PanickingKv {
    armed: AtomicBool,
    inner: MemoryKv,
}

impl PanickingKv {
    fn armed() -> Arc<Self> {
        Arc::new(Self {
            armed: AtomicBool::new(true),
            inner: MemoryKv::new(),
        })
    }
}

impl KeyValueStore for PanickingKv {
    fn get(&self, key: &str) -> Option<String> {
        if self.armed.load(Ordering::SeqCst) {
            panic!("storage read exploded");
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> bool {
        self.inner.remove(key)
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

#[tokio::test]
async fn handler_panic_returns_internal_error() {
    let (app, _state) = build_app_over(PanickingKv::armed(), None);
    let response = get(&app, "/api/v1/items").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().contains_key("x-request-id"));
    let json = body_json(response).await;
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn server_keeps_serving_after_a_panic() {
    let kv = PanickingKv::armed();
    let (app, _state) = build_app_over(kv.clone(), None);
    let first = get(&app, "/api/v1/items").await;
    assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);

    kv.armed.store(false, Ordering::SeqCst);
    let second = get(&app, "/api/v1/items").await;
    assert_eq!(second.status(), StatusCode::OK);
}
