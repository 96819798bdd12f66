//! Shared fixtures for sync integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use itemkeeper_core::record::{ItemRecord, RecycleBinEntry, Source};
use itemkeeper_store::{MemoryKv, RecordStore};
use itemkeeper_sync::{LedgerRow, MemoryLedger, Reconciler};

pub struct Harness {
    pub kv: Arc<MemoryKv>,
    pub store: RecordStore,
    pub ledger: Arc<MemoryLedger>,
    pub reconciler: Reconciler,
}

pub fn harness() -> Harness {
    let kv = Arc::new(MemoryKv::new());
    let store = RecordStore::new(kv.clone());
    let ledger = Arc::new(MemoryLedger::new());
    let reconciler = Reconciler::new(ledger.clone(), store.clone());
    Harness {
        kv,
        store,
        ledger,
        reconciler,
    }
}

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, d, 10, 0, 0).unwrap()
}

pub fn record(id: &str, item: &str) -> ItemRecord {
    ItemRecord {
        id: id.to_string(),
        owner_id: "u1".to_string(),
        item: item.to_string(),
        location: "shelf".to_string(),
        created_at: day(1),
        raw_input: format!("{item} on the shelf"),
        source: Source::Text,
        tags: Vec::new(),
    }
}

pub fn bin_entry(id: &str, item: &str) -> RecycleBinEntry {
    record(id, item).into_bin_entry("no longer needed", day(2))
}

pub fn remote_row(id: &str, item: &str, owner: &str) -> LedgerRow {
    LedgerRow {
        id: id.to_string(),
        user_id: owner.to_string(),
        item: item.to_string(),
        location: "hook".to_string(),
        created_at: day(3),
        raw_input: String::new(),
        source: "text".to_string(),
        tags: None,
        updated_at: Some(day(3)),
        deleted_at: None,
        delete_reason: None,
    }
}

pub fn remote_bin_row(id: &str, item: &str, owner: &str, deleted: u32) -> LedgerRow {
    LedgerRow {
        deleted_at: Some(day(deleted)),
        delete_reason: Some("broken".to_string()),
        ..remote_row(id, item, owner)
    }
}
