//! The two local collections and their metadata.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use itemkeeper_core::error::CoreError;
use itemkeeper_core::record::{ItemRecord, RecycleBinEntry};
use itemkeeper_core::types::Timestamp;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::kv::KeyValueStore;

/// Current local schema version.
pub const SCHEMA_VERSION: &str = "1.0.0";

const KEY_RECORDS: &str = "item-keeper-records";
const KEY_RECYCLE_BIN: &str = "item-keeper-recycle-bin";
const KEY_VERSION: &str = "item-keeper-version";
const KEY_LAST_SYNC: &str = "item-keeper-last-sync";

/// Snapshot of local storage usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageInfo {
    pub records_count: usize,
    pub recycle_bin_count: usize,
    /// Serialized size of both collections.
    pub bytes_used: usize,
    pub available: bool,
}

impl StorageInfo {
    /// Size in KiB with one decimal, e.g. `"1.5 KB"`.
    pub fn size_label(&self) -> String {
        format!("{:.1} KB", self.bytes_used as f64 / 1024.0)
    }
}

/// Counts written by a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub records: usize,
    pub recycle_bin: usize,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        format!(
            "Imported {} records and {} recycle bin entries",
            self.records, self.recycle_bin
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    version: &'a str,
    export_time: Timestamp,
    records: &'a [ItemRecord],
    recycle_bin: &'a [RecycleBinEntry],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportDocument {
    records: Option<serde_json::Value>,
    recycle_bin: Option<serde_json::Value>,
}

/// Authoritative holder of the local active collection and recycle bin.
///
/// Every save replaces the whole collection. There is no locking here:
/// callers serialize their own read-modify-write sequences.
#[derive(Clone)]
pub struct RecordStore {
    kv: Arc<dyn KeyValueStore>,
}

impl RecordStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    // -- Collections --------------------------------------------------------

    pub fn load_active(&self) -> Vec<ItemRecord> {
        self.load_collection(KEY_RECORDS)
    }

    pub fn save_active(&self, records: &[ItemRecord]) -> bool {
        self.save_collection(KEY_RECORDS, records)
    }

    pub fn load_bin(&self) -> Vec<RecycleBinEntry> {
        self.load_collection(KEY_RECYCLE_BIN)
    }

    pub fn save_bin(&self, entries: &[RecycleBinEntry]) -> bool {
        self.save_collection(KEY_RECYCLE_BIN, entries)
    }

    /// Remove both collections and all metadata markers.
    pub fn clear_all(&self) -> bool {
        if !self.kv.is_available() {
            return false;
        }
        [KEY_RECORDS, KEY_RECYCLE_BIN, KEY_VERSION, KEY_LAST_SYNC]
            .iter()
            .fold(true, |ok, key| self.kv.remove(key) && ok)
    }

    // -- Metadata -----------------------------------------------------------

    /// Returns `true` when the stored schema marker matches
    /// [`SCHEMA_VERSION`]; otherwise records the current version and
    /// returns `false` so the caller can decide whether to migrate.
    pub fn check_version(&self) -> bool {
        match self.kv.get(KEY_VERSION) {
            Some(v) if v == SCHEMA_VERSION => true,
            stored => {
                tracing::info!(
                    stored = stored.as_deref().unwrap_or("<none>"),
                    current = SCHEMA_VERSION,
                    "Local schema version mismatch"
                );
                self.kv.set(KEY_VERSION, SCHEMA_VERSION);
                false
            }
        }
    }

    /// Time of the last successful push, pull or merge.
    pub fn last_sync(&self) -> Option<Timestamp> {
        let raw = self.kv.get(KEY_LAST_SYNC)?;
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unparseable last-sync marker");
                None
            }
        }
    }

    pub fn mark_synced(&self, at: Timestamp) -> bool {
        self.kv.set(KEY_LAST_SYNC, &at.to_rfc3339())
    }

    pub fn storage_info(&self) -> StorageInfo {
        let records_raw = self.kv.get(KEY_RECORDS).unwrap_or_default();
        let bin_raw = self.kv.get(KEY_RECYCLE_BIN).unwrap_or_default();
        StorageInfo {
            records_count: self.load_active().len(),
            recycle_bin_count: self.load_bin().len(),
            bytes_used: records_raw.len() + bin_raw.len(),
            available: self.kv.is_available(),
        }
    }

    // -- Export / import ----------------------------------------------------

    /// Pretty-printed backup of both collections.
    pub fn export_json(&self, now: Timestamp) -> Result<String, CoreError> {
        let records = self.load_active();
        let recycle_bin = self.load_bin();
        let doc = ExportDocument {
            version: SCHEMA_VERSION,
            export_time: now,
            records: &records,
            recycle_bin: &recycle_bin,
        };
        serde_json::to_string_pretty(&doc)
            .map_err(|e| CoreError::Internal(format!("Failed to serialize export: {e}")))
    }

    /// Replace both collections from a backup produced by [`export_json`].
    ///
    /// The document is fully validated before anything is written: a missing
    /// `records` or `recycleBin` array, or any malformed element, rejects the
    /// whole import.
    ///
    /// [`export_json`]: Self::export_json
    pub fn import_json(&self, json: &str) -> Result<ImportSummary, CoreError> {
        let doc: ImportDocument = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Import is not valid JSON: {e}")))?;

        let records: Vec<ItemRecord> = require_array(doc.records, "records")?;
        let recycle_bin: Vec<RecycleBinEntry> = require_array(doc.recycle_bin, "recycleBin")?;

        if !self.save_active(&records) || !self.save_bin(&recycle_bin) {
            return Err(CoreError::Internal("Failed to save imported data".to_string()));
        }

        Ok(ImportSummary {
            records: records.len(),
            recycle_bin: recycle_bin.len(),
        })
    }

    // -- Helpers ------------------------------------------------------------

    fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let Some(raw) = self.kv.get(key) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(key, error = %e, "Discarding unreadable local collection");
                Vec::new()
            }
        }
    }

    fn save_collection<T: Serialize>(&self, key: &str, items: &[T]) -> bool {
        match serde_json::to_string(items) {
            Ok(data) => self.kv.set(key, &data),
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to serialize local collection");
                false
            }
        }
    }
}

fn require_array<T: DeserializeOwned>(
    value: Option<serde_json::Value>,
    field: &str,
) -> Result<Vec<T>, CoreError> {
    match value {
        Some(v @ serde_json::Value::Array(_)) => serde_json::from_value(v)
            .map_err(|e| CoreError::Validation(format!("Invalid entry in '{field}': {e}"))),
        _ => Err(CoreError::Validation(format!(
            "Import is missing the '{field}' array"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
