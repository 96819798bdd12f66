//! HTTP-level integration tests for the `/sync` endpoints.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_synced_app, build_test_app, create_item, get, get_as, post_empty, OWNER,
};
use itemkeeper_core::record::{ItemRecord, Source};
use itemkeeper_sync::{LedgerOp, LedgerRow, LedgerTable};

fn remote_row(id: &str, item: &str) -> LedgerRow {
    let now = chrono::Utc::now();
    LedgerRow {
        id: id.to_string(),
        user_id: OWNER.to_string(),
        item: item.to_string(),
        location: "cloud shelf".to_string(),
        created_at: now,
        raw_input: String::new(),
        source: "text".to_string(),
        tags: Some(vec!["remote".to_string()]),
        updated_at: Some(now),
        deleted_at: None,
        delete_reason: None,
    }
}

// ---------------------------------------------------------------------------
// Access control
// ---------------------------------------------------------------------------

#[tokio::test]
async fn guest_cannot_sync() {
    let t = build_synced_app();
    for op in ["push", "pull", "merge"] {
        let response = post_empty(&t.app, &format!("/api/v1/sync/{op}"), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{op}");
        assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
    }
    let response = get(&t.app, "/api/v1/sync/status").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(t.ledger().write_calls(), 0);
}

#[tokio::test]
async fn blank_owner_header_is_guest() {
    let t = build_synced_app();
    let response = post_empty(&t.app, "/api/v1/sync/push", Some("  ")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sync_disabled_without_ledger() {
    let t = build_test_app(None);
    let response = post_empty(&t.app, "/api/v1/sync/push", Some(OWNER)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "SYNC_DISABLED");
}

#[tokio::test]
async fn concurrent_bulk_sync_is_rejected() {
    let t = build_synced_app();
    let _busy = t.state.begin_sync().unwrap();

    let response = post_empty(&t.app, "/api/v1/sync/merge", Some(OWNER)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "SYNC_BUSY");
}

#[tokio::test]
async fn sync_slot_is_released_after_each_operation() {
    let t = build_synced_app();
    for _ in 0..2 {
        let response = post_empty(&t.app, "/api/v1/sync/push", Some(OWNER)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert!(t.state.begin_sync().is_ok());
}

// ---------------------------------------------------------------------------
// Push / pull / merge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn push_uploads_local_collections() {
    let t = build_synced_app();
    create_item(&t.app, "wallet", "bag", None).await;
    create_item(&t.app, "keys", "hook", None).await;

    let response = post_empty(&t.app, "/api/v1/sync/push", Some(OWNER)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], true);
    assert_eq!(
        json["data"]["message"],
        "Pushed 2 records and 0 recycle bin entries to the cloud"
    );

    let rows = t.ledger().rows(LedgerTable::ItemRecords);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.user_id == OWNER));
}

#[tokio::test]
async fn pull_replaces_local_collections() {
    let t = build_synced_app();
    create_item(&t.app, "local only", "desk", None).await;
    t.ledger().seed(LedgerTable::ItemRecords, [remote_row("r1", "cloud item")]);

    let json = body_json(post_empty(&t.app, "/api/v1/sync/pull", Some(OWNER)).await).await;
    assert_eq!(json["data"]["success"], true);
    assert_eq!(
        json["data"]["message"],
        "Pulled 1 records and 0 recycle bin entries from the cloud"
    );

    let active = t.state.store.load_active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, "r1");
    assert_eq!(active[0].tags, vec!["remote".to_string()]);
}

#[tokio::test]
async fn merge_exchanges_one_sided_records() {
    let t = build_synced_app();
    let local = ItemRecord::new(OWNER, "tent", "garage", "", Source::Text, chrono::Utc::now());
    t.state.store.save_active(&[local.clone()]);
    t.ledger().seed(LedgerTable::ItemRecords, [remote_row("r1", "stove")]);

    let json = body_json(post_empty(&t.app, "/api/v1/sync/merge", Some(OWNER)).await).await;
    assert_eq!(json["data"]["success"], true);
    assert_eq!(
        json["data"]["message"],
        "Merge complete: uploaded 1, downloaded 1"
    );

    let active_ids: Vec<String> = t.state.store.load_active().into_iter().map(|r| r.id).collect();
    assert!(active_ids.contains(&local.id));
    assert!(active_ids.contains(&"r1".to_string()));
    assert_eq!(t.ledger().rows(LedgerTable::ItemRecords).len(), 2);
}

#[tokio::test]
async fn failed_sync_is_reported_in_body() {
    let t = build_synced_app();
    create_item(&t.app, "wallet", "bag", None).await;
    t.ledger().fail(LedgerOp::Upsert, LedgerTable::ItemRecords);

    let response = post_empty(&t.app, "/api/v1/sync/push", Some(OWNER)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], false);
    assert!(json["data"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Push failed: "));
    assert_eq!(t.state.store.load_active().len(), 1);
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_reports_local_and_cloud_counts() {
    let t = build_synced_app();
    create_item(&t.app, "wallet", "bag", None).await;
    t.ledger().seed(
        LedgerTable::ItemRecords,
        [remote_row("r1", "a"), remote_row("r2", "b")],
    );

    let json = body_json(get_as(&t.app, "/api/v1/sync/status", OWNER).await).await;
    assert_eq!(json["data"]["local_records"], 1);
    assert_eq!(json["data"]["local_recycle_bin"], 0);
    assert_eq!(json["data"]["cloud_records"], 2);
    assert_eq!(json["data"]["cloud_recycle_bin"], 0);
    assert!(json["data"]["last_sync"].is_null());
}

#[tokio::test]
async fn status_after_sync_has_last_sync() {
    let t = build_synced_app();
    post_empty(&t.app, "/api/v1/sync/merge", Some(OWNER)).await;

    let json = body_json(get_as(&t.app, "/api/v1/sync/status", OWNER).await).await;
    assert!(json["data"]["last_sync"].is_string());
}

#[tokio::test]
async fn status_is_zero_when_ledger_fails() {
    let t = build_synced_app();
    create_item(&t.app, "wallet", "bag", None).await;
    t.ledger().fail_all();

    let response = get_as(&t.app, "/api/v1/sync/status", OWNER).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["local_records"], 0);
    assert_eq!(json["data"]["cloud_records"], 0);
}

#[tokio::test]
async fn cached_status_falls_back_to_fresh_read() {
    let t = build_synced_app();
    t.ledger().seed(LedgerTable::ItemRecords, [remote_row("r1", "a")]);

    let json = body_json(get_as(&t.app, "/api/v1/sync/status?cached=true", OWNER).await).await;
    assert_eq!(json["data"]["cloud_records"], 1);
}
