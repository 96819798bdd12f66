use chrono::{DateTime, Duration, TimeZone, Utc};
use itemkeeper_db::models::ledger::{LedgerRow, LedgerTable};
use itemkeeper_db::repositories::LedgerRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
}

fn active_row(id: &str, owner: &str, item: &str, day: u32) -> LedgerRow {
    LedgerRow {
        id: id.to_string(),
        user_id: owner.to_string(),
        item: item.to_string(),
        location: "drawer".to_string(),
        created_at: at(day),
        raw_input: format!("{item} in the drawer"),
        source: "text".to_string(),
        tags: Some(vec!["home".to_string()]),
        updated_at: Some(at(day)),
        deleted_at: None,
        delete_reason: None,
    }
}

fn bin_row(id: &str, owner: &str, deleted_day: u32) -> LedgerRow {
    LedgerRow {
        deleted_at: Some(at(deleted_day)),
        delete_reason: Some("cleanup".to_string()),
        ..active_row(id, owner, "old scarf", 1)
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_health_check(pool: PgPool) {
    itemkeeper_db::health_check(&pool).await.unwrap();
}

// ---------------------------------------------------------------------------
// Upsert
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upsert_is_idempotent(pool: PgPool) {
    let rows = vec![active_row("a", "u1", "wallet", 1), active_row("b", "u1", "keys", 2)];

    LedgerRepo::upsert(&pool, LedgerTable::ItemRecords, &rows).await.unwrap();
    LedgerRepo::upsert(&pool, LedgerTable::ItemRecords, &rows).await.unwrap();

    let count = LedgerRepo::count_for_owner(&pool, LedgerTable::ItemRecords, "u1")
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upsert_replaces_fields(pool: PgPool) {
    let mut row = active_row("a", "u1", "wallet", 1);
    LedgerRepo::upsert(&pool, LedgerTable::ItemRecords, &[row.clone()])
        .await
        .unwrap();

    row.location = "coat pocket".to_string();
    row.tags = Some(vec!["home".to_string(), "daily".to_string()]);
    LedgerRepo::upsert(&pool, LedgerTable::ItemRecords, &[row.clone()])
        .await
        .unwrap();

    let rows = LedgerRepo::list_for_owner(&pool, LedgerTable::ItemRecords, "u1", false)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].location, "coat pocket");
    assert_eq!(rows[0].tags.as_deref().unwrap(), ["home", "daily"]);
    assert!(rows[0].deleted_at.is_none());
    assert!(rows[0].delete_reason.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upsert_never_overwrites_other_owner(pool: PgPool) {
    LedgerRepo::upsert(&pool, LedgerTable::ItemRecords, &[active_row("a", "u1", "wallet", 1)])
        .await
        .unwrap();

    let written = LedgerRepo::upsert(
        &pool,
        LedgerTable::ItemRecords,
        &[active_row("a", "u2", "hijacked", 1)],
    )
    .await
    .unwrap();
    assert_eq!(written, 0);

    let rows = LedgerRepo::list_for_owner(&pool, LedgerTable::ItemRecords, "u1", false)
        .await
        .unwrap();
    assert_eq!(rows[0].item, "wallet");
    let other = LedgerRepo::count_for_owner(&pool, LedgerTable::ItemRecords, "u2")
        .await
        .unwrap();
    assert_eq!(other, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upsert_empty_batch_is_noop(pool: PgPool) {
    let written = LedgerRepo::upsert(&pool, LedgerTable::RecycleBin, &[]).await.unwrap();
    assert_eq!(written, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upsert_large_batch_spans_chunks(pool: PgPool) {
    let rows: Vec<LedgerRow> = (0..2500)
        .map(|i| LedgerRow {
            created_at: at(1) + Duration::seconds(i),
            ..active_row(&format!("r{i}"), "u1", "bulk", 1)
        })
        .collect();

    let written = LedgerRepo::upsert(&pool, LedgerTable::ItemRecords, &rows).await.unwrap();
    assert_eq!(written, 2500);
}

// ---------------------------------------------------------------------------
// Insert
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_duplicate_id_is_unique_violation(pool: PgPool) {
    let row = active_row("a", "u1", "wallet", 1);
    LedgerRepo::insert(&pool, LedgerTable::ItemRecords, &[row.clone()])
        .await
        .unwrap();

    let err = LedgerRepo::insert(&pool, LedgerTable::ItemRecords, &[row])
        .await
        .unwrap_err();
    let code = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|c| c.to_string());
    assert_eq!(code.as_deref(), Some("23505"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_bin_rows_keep_deletion_fields(pool: PgPool) {
    LedgerRepo::insert(&pool, LedgerTable::RecycleBin, &[bin_row("x", "u1", 5)])
        .await
        .unwrap();

    let rows = LedgerRepo::list_for_owner(&pool, LedgerTable::RecycleBin, "u1", false)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].deleted_at, Some(at(5)));
    assert_eq!(rows[0].delete_reason.as_deref(), Some("cleanup"));
}

// ---------------------------------------------------------------------------
// Reads and deletes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_newest_first(pool: PgPool) {
    let rows = vec![
        active_row("a", "u1", "first", 1),
        active_row("c", "u1", "third", 3),
        active_row("b", "u1", "second", 2),
    ];
    LedgerRepo::upsert(&pool, LedgerTable::ItemRecords, &rows).await.unwrap();

    let listed = LedgerRepo::list_for_owner(&pool, LedgerTable::ItemRecords, "u1", true)
        .await
        .unwrap();
    let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["c", "b", "a"]);

    let bin = vec![bin_row("x", "u1", 4), bin_row("y", "u1", 9)];
    LedgerRepo::upsert(&pool, LedgerTable::RecycleBin, &bin).await.unwrap();
    let listed = LedgerRepo::list_for_owner(&pool, LedgerTable::RecycleBin, "u1", true)
        .await
        .unwrap();
    assert_eq!(listed[0].id, "y");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reads_are_owner_scoped(pool: PgPool) {
    let rows = vec![active_row("a", "u1", "wallet", 1), active_row("b", "u2", "keys", 1)];
    LedgerRepo::upsert(&pool, LedgerTable::ItemRecords, &rows).await.unwrap();

    let u1 = LedgerRepo::list_for_owner(&pool, LedgerTable::ItemRecords, "u1", false)
        .await
        .unwrap();
    assert_eq!(u1.len(), 1);
    assert_eq!(u1[0].id, "a");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_filters_by_owner(pool: PgPool) {
    LedgerRepo::upsert(&pool, LedgerTable::ItemRecords, &[active_row("a", "u1", "wallet", 1)])
        .await
        .unwrap();

    let removed = LedgerRepo::delete(&pool, LedgerTable::ItemRecords, "a", "u2")
        .await
        .unwrap();
    assert!(!removed);

    let removed = LedgerRepo::delete(&pool, LedgerTable::ItemRecords, "a", "u1")
        .await
        .unwrap();
    assert!(removed);

    let count = LedgerRepo::count_for_owner(&pool, LedgerTable::ItemRecords, "u1")
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_null_tags_read_back_as_none(pool: PgPool) {
    let row = LedgerRow {
        tags: None,
        ..active_row("a", "u1", "wallet", 1)
    };
    LedgerRepo::upsert(&pool, LedgerTable::ItemRecords, &[row]).await.unwrap();

    let rows = LedgerRepo::list_for_owner(&pool, LedgerTable::ItemRecords, "u1", false)
        .await
        .unwrap();
    assert!(rows[0].tags.is_none());
}
