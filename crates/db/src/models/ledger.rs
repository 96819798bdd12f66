//! Remote ledger tables and the row shape shared by both of them.

use serde::Serialize;
use sqlx::FromRow;
use itemkeeper_core::types::Timestamp;

/// The two mirrored tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerTable {
    /// Mirror of the local active collection.
    ItemRecords,
    /// Mirror of the local recycle bin.
    RecycleBin,
}

impl LedgerTable {
    /// Database table name.
    pub fn name(self) -> &'static str {
        match self {
            Self::ItemRecords => "item_records",
            Self::RecycleBin => "recycle_bin",
        }
    }

    /// Column used for newest-first ordering.
    pub fn recency_column(self) -> &'static str {
        match self {
            Self::ItemRecords => "created_at",
            Self::RecycleBin => "deleted_at",
        }
    }

    /// Whether the table carries `deleted_at` / `delete_reason`.
    pub fn has_bin_columns(self) -> bool {
        matches!(self, Self::RecycleBin)
    }
}

/// A row from either ledger table.
///
/// `deleted_at` and `delete_reason` are always `None` for `item_records`.
/// `tags` is nullable in the schema; readers treat `NULL` as no tags.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct LedgerRow {
    pub id: String,
    pub user_id: String,
    pub item: String,
    pub location: String,
    pub created_at: Timestamp,
    pub raw_input: String,
    pub source: String,
    pub tags: Option<Vec<String>>,
    pub updated_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
    pub delete_reason: Option<String>,
}
