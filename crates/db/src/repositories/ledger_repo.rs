//! Repository for the `item_records` and `recycle_bin` ledger tables.
//!
//! Both tables share one row shape, so every operation takes a
//! [`LedgerTable`] and dispatches on it. Every read, update and delete is
//! filtered by `user_id`; an upsert never overwrites a row that belongs to a
//! different owner.

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::ledger::{LedgerRow, LedgerTable};

/// Rows per `INSERT` statement. Keeps bind parameters well under the
/// Postgres limit of 65535.
const BATCH_SIZE: usize = 1000;

/// Columns shared by both tables, in bind order.
const BASE_COLUMNS: &str = "id, user_id, item, location, created_at, raw_input, source, tags, updated_at";

/// Provides keyed upsert, insert, delete and owner-scoped reads.
pub struct LedgerRepo;

impl LedgerRepo {
    // ── Writes ────────────────────────────────────────────────────────

    /// Insert-or-replace `rows` keyed on `id`.
    ///
    /// A conflicting row owned by another user is left untouched. All
    /// batches run in one transaction. Returns the number of rows written.
    pub async fn upsert(
        pool: &PgPool,
        table: LedgerTable,
        rows: &[LedgerRow],
    ) -> Result<u64, sqlx::Error> {
        Self::write(pool, table, rows, true).await
    }

    /// Plain insert. Fails with a unique violation (SQLSTATE 23505) if any
    /// id already exists.
    pub async fn insert(
        pool: &PgPool,
        table: LedgerTable,
        rows: &[LedgerRow],
    ) -> Result<u64, sqlx::Error> {
        Self::write(pool, table, rows, false).await
    }

    /// Delete one row by id, scoped to `user_id`.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(
        pool: &PgPool,
        table: LedgerTable,
        id: &str,
        user_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let sql = format!("DELETE FROM {} WHERE id = $1 AND user_id = $2", table.name());
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Reads ─────────────────────────────────────────────────────────

    /// All rows belonging to `user_id`.
    ///
    /// When `newest_first` is set, rows are ordered by the table's recency
    /// column descending; otherwise order is unspecified.
    pub async fn list_for_owner(
        pool: &PgPool,
        table: LedgerTable,
        user_id: &str,
        newest_first: bool,
    ) -> Result<Vec<LedgerRow>, sqlx::Error> {
        let order = if newest_first {
            format!(" ORDER BY {} DESC", table.recency_column())
        } else {
            String::new()
        };
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = $1{order}",
            select_columns(table),
            table.name()
        );
        sqlx::query_as::<_, LedgerRow>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Number of rows belonging to `user_id`.
    pub async fn count_for_owner(
        pool: &PgPool,
        table: LedgerTable,
        user_id: &str,
    ) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE user_id = $1", table.name());
        let count: (i64,) = sqlx::query_as(&sql).bind(user_id).fetch_one(pool).await?;
        Ok(count.0)
    }

    // ── Private helpers ───────────────────────────────────────────────

    async fn write(
        pool: &PgPool,
        table: LedgerTable,
        rows: &[LedgerRow],
        upsert: bool,
    ) -> Result<u64, sqlx::Error> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = pool.begin().await?;
        let mut written = 0;
        for chunk in rows.chunks(BATCH_SIZE) {
            let mut qb = build_insert(table, chunk);
            if upsert {
                qb.push(conflict_clause(table));
            }
            written += qb.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;
        Ok(written)
    }
}

/// `INSERT INTO <table> (<columns>) VALUES (...), (...)` for one batch.
fn build_insert(table: LedgerTable, rows: &[LedgerRow]) -> QueryBuilder<'static, Postgres> {
    let columns = if table.has_bin_columns() {
        format!("{BASE_COLUMNS}, deleted_at, delete_reason")
    } else {
        BASE_COLUMNS.to_string()
    };
    let mut qb = QueryBuilder::new(format!("INSERT INTO {} ({columns}) ", table.name()));
    qb.push_values(rows, |mut b, row| {
        b.push_bind(row.id.clone())
            .push_bind(row.user_id.clone())
            .push_bind(row.item.clone())
            .push_bind(row.location.clone())
            .push_bind(row.created_at)
            .push_bind(row.raw_input.clone())
            .push_bind(row.source.clone())
            .push_bind(row.tags.clone())
            .push_bind(row.updated_at.unwrap_or_else(chrono::Utc::now));
        if table.has_bin_columns() {
            b.push_bind(row.deleted_at.unwrap_or(row.created_at))
                .push_bind(row.delete_reason.clone().unwrap_or_default());
        }
    });
    qb
}

/// `ON CONFLICT (id) DO UPDATE ...` restricted to rows of the same owner.
fn conflict_clause(table: LedgerTable) -> String {
    let mut set = String::from(
        "item = EXCLUDED.item, location = EXCLUDED.location, \
         created_at = EXCLUDED.created_at, raw_input = EXCLUDED.raw_input, \
         source = EXCLUDED.source, tags = EXCLUDED.tags, updated_at = EXCLUDED.updated_at",
    );
    if table.has_bin_columns() {
        set.push_str(", deleted_at = EXCLUDED.deleted_at, delete_reason = EXCLUDED.delete_reason");
    }
    let name = table.name();
    format!(" ON CONFLICT (id) DO UPDATE SET {set} WHERE {name}.user_id = EXCLUDED.user_id")
}

/// Select list yielding a full [`LedgerRow`] from either table.
fn select_columns(table: LedgerTable) -> String {
    if table.has_bin_columns() {
        format!("{BASE_COLUMNS}, deleted_at, delete_reason")
    } else {
        format!("{BASE_COLUMNS}, NULL::timestamptz AS deleted_at, NULL::text AS delete_reason")
    }
}
