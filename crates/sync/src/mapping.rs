//! Conversion between local records and ledger rows.
//!
//! Outbound rows always carry the syncing owner as `user_id` and a
//! write-time `updated_at`. Inbound rows are defaulted rather than
//! rejected: missing tags become empty, an unknown source becomes `text`.

use itemkeeper_core::record::{ItemRecord, RecycleBinEntry, Source};
use itemkeeper_core::types::Timestamp;
use itemkeeper_db::models::ledger::LedgerRow;

pub fn record_to_row(record: &ItemRecord, owner: &str, now: Timestamp) -> LedgerRow {
    LedgerRow {
        id: record.id.clone(),
        user_id: owner.to_string(),
        item: record.item.clone(),
        location: record.location.clone(),
        created_at: record.created_at,
        raw_input: record.raw_input.clone(),
        source: record.source.as_str().to_string(),
        tags: Some(record.tags.clone()),
        updated_at: Some(now),
        deleted_at: None,
        delete_reason: None,
    }
}

pub fn bin_entry_to_row(entry: &RecycleBinEntry, owner: &str, now: Timestamp) -> LedgerRow {
    LedgerRow {
        deleted_at: Some(entry.deleted_at),
        delete_reason: Some(entry.delete_reason.clone()),
        ..record_to_row(&entry.record, owner, now)
    }
}

pub fn row_to_record(row: LedgerRow) -> ItemRecord {
    let source = Source::from_name(&row.source).unwrap_or_else(|_| {
        tracing::warn!(id = %row.id, source = %row.source, "Unknown source on remote row, using text");
        Source::Text
    });
    ItemRecord {
        id: row.id,
        owner_id: row.user_id,
        item: row.item,
        location: row.location,
        created_at: row.created_at,
        raw_input: row.raw_input,
        source,
        tags: row.tags.unwrap_or_default(),
    }
}

/// A bin row missing `deleted_at` falls back to its `created_at`.
pub fn row_to_bin_entry(mut row: LedgerRow) -> RecycleBinEntry {
    let deleted_at = row.deleted_at.take().unwrap_or(row.created_at);
    let delete_reason = row.delete_reason.take().unwrap_or_default();
    RecycleBinEntry {
        record: row_to_record(row),
        deleted_at,
        delete_reason,
    }
}
