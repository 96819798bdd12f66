//! Pure operations over the active collection and the recycle bin.
//!
//! Callers load both collections from the record store, apply one of these
//! operations, and write the whole collection back. Nothing here touches
//! storage or the network.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::error::CoreError;
use crate::record::{ItemRecord, RecycleBinEntry, Source};
use crate::types::{RecordId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Days a recycle-bin entry is kept before the expiry sweep removes it.
pub const DEFAULT_BIN_RETENTION_DAYS: i64 = 30;

/// Number of most recent items listed in [`Statistics::recent_items`].
const RECENT_ITEMS: usize = 3;

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Build a new active record. Item and location are trimmed and must be
/// non-empty.
pub fn create_record(
    owner_id: &str,
    item: &str,
    location: &str,
    raw_input: &str,
    source: Source,
    now: Timestamp,
) -> Result<ItemRecord, CoreError> {
    let item = item.trim();
    let location = location.trim();
    if item.is_empty() {
        return Err(CoreError::Validation("Item must not be empty".to_string()));
    }
    if location.is_empty() {
        return Err(CoreError::Validation("Location must not be empty".to_string()));
    }
    Ok(ItemRecord::new(owner_id, item, location, raw_input, source, now))
}

// ---------------------------------------------------------------------------
// Search and tagging
// ---------------------------------------------------------------------------

/// Records whose item, location or raw input contains `query`
/// (case-insensitive), in collection order.
pub fn search<'a>(records: &'a [ItemRecord], query: &str) -> Vec<&'a ItemRecord> {
    records.iter().filter(|r| r.matches_keyword(query)).collect()
}

/// Ids of records matching `keyword` the same way [`search`] does.
pub fn matching_ids(records: &[ItemRecord], keyword: &str) -> Vec<RecordId> {
    search(records, keyword).into_iter().map(|r| r.id.clone()).collect()
}

/// Append `tag` to every record whose item or raw input mentions `keyword`.
///
/// Location is not matched. Returns the ids of records that actually changed.
pub fn classify(records: &mut [ItemRecord], keyword: &str, tag: &str) -> Vec<RecordId> {
    let needle = keyword.to_lowercase();
    records
        .iter_mut()
        .filter(|r| {
            r.item.to_lowercase().contains(&needle) || r.raw_input.to_lowercase().contains(&needle)
        })
        .filter_map(|r| r.add_tag(tag).then(|| r.id.clone()))
        .collect()
}

/// Append `tag` to the record with the given id.
///
/// Returns `Ok(false)` when the tag was already present.
pub fn tag_record(records: &mut [ItemRecord], id: &str, tag: &str) -> Result<bool, CoreError> {
    let tag = validate_tag(tag)?;
    let record = records
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| not_found("ItemRecord", id))?;
    Ok(record.add_tag(tag))
}

/// Trim a tag and reject empty values.
pub fn validate_tag(tag: &str) -> Result<&str, CoreError> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Tag must not be empty".to_string()));
    }
    Ok(trimmed)
}

// ---------------------------------------------------------------------------
// Recycle bin
// ---------------------------------------------------------------------------

/// Move the active records named by `ids` into the bin.
///
/// Unknown ids are ignored. Returns the new bin entries in active-collection
/// order.
pub fn move_to_bin(
    active: &mut Vec<ItemRecord>,
    bin: &mut Vec<RecycleBinEntry>,
    ids: &[RecordId],
    reason: &str,
    now: Timestamp,
) -> Vec<RecycleBinEntry> {
    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();

    let (moving, keep): (Vec<ItemRecord>, Vec<ItemRecord>) = std::mem::take(active)
        .into_iter()
        .partition(|r| wanted.contains(r.id.as_str()));
    *active = keep;

    let moved: Vec<RecycleBinEntry> = moving
        .into_iter()
        .map(|r| r.into_bin_entry(reason, now))
        .collect();

    // A record lives in exactly one collection: drop any stale bin copy.
    let moved_ids: HashSet<&str> = moved.iter().map(RecycleBinEntry::id).collect();
    bin.retain(|e| !moved_ids.contains(e.id()));
    bin.extend(moved.iter().cloned());

    moved
}

/// Move a bin entry back into the active collection.
pub fn restore(
    active: &mut Vec<ItemRecord>,
    bin: &mut Vec<RecycleBinEntry>,
    id: &str,
) -> Result<ItemRecord, CoreError> {
    if active.iter().any(|r| r.id == id) {
        return Err(CoreError::Conflict(format!(
            "Record {id} is already in the active collection"
        )));
    }
    let entry = take_bin_entry(bin, id)?;
    let record = entry.into_record();
    active.push(record.clone());
    Ok(record)
}

/// Permanently remove one bin entry.
pub fn purge(bin: &mut Vec<RecycleBinEntry>, id: &str) -> Result<RecycleBinEntry, CoreError> {
    take_bin_entry(bin, id)
}

/// Empty the bin, returning everything that was in it.
pub fn clear_bin(bin: &mut Vec<RecycleBinEntry>) -> Vec<RecycleBinEntry> {
    std::mem::take(bin)
}

/// Remove bin entries deleted at or before `now - retention`.
///
/// Returns the removed entries.
pub fn sweep_expired(
    bin: &mut Vec<RecycleBinEntry>,
    now: Timestamp,
    retention: chrono::Duration,
) -> Vec<RecycleBinEntry> {
    let cutoff = now - retention;
    let (keep, expired): (Vec<_>, Vec<_>) = std::mem::take(bin)
        .into_iter()
        .partition(|e| e.deleted_at > cutoff);
    *bin = keep;
    expired
}

fn take_bin_entry(bin: &mut Vec<RecycleBinEntry>, id: &str) -> Result<RecycleBinEntry, CoreError> {
    let pos = bin
        .iter()
        .position(|e| e.id() == id)
        .ok_or_else(|| not_found("RecycleBinEntry", id))?;
    Ok(bin.remove(pos))
}

fn not_found(entity: &'static str, id: &str) -> CoreError {
    CoreError::NotFound {
        entity,
        id: id.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Per-tag usage count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Summary of the active collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_items: usize,
    pub distinct_locations: usize,
    /// Sorted by count descending, then tag ascending.
    pub tag_counts: Vec<TagCount>,
    /// Items of the last records in collection order, oldest first.
    pub recent_items: Vec<String>,
}

impl Statistics {
    /// Multi-line human-readable report.
    pub fn summary(&self) -> String {
        if self.total_items == 0 {
            return "No items recorded yet".to_string();
        }
        let mut out = format!(
            "Items: {}\nLocations: {}\n",
            self.total_items, self.distinct_locations
        );
        if !self.tag_counts.is_empty() {
            out.push_str("Tags:\n");
            for tc in &self.tag_counts {
                out.push_str(&format!("  - {}: {}\n", tc.tag, tc.count));
            }
        }
        out.push_str(&format!("Recent: {}", self.recent_items.join(", ")));
        out
    }
}

/// Compute [`Statistics`] for the active collection.
pub fn statistics(records: &[ItemRecord]) -> Statistics {
    let distinct_locations = records
        .iter()
        .map(|r| r.location.as_str())
        .collect::<HashSet<_>>()
        .len();

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for tag in records.iter().flat_map(|r| r.tags.iter()) {
        *counts.entry(tag.as_str()).or_default() += 1;
    }
    let mut tag_counts: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    // Stable sort keeps the BTreeMap's ascending tag order within equal counts.
    tag_counts.sort_by(|a, b| b.count.cmp(&a.count));

    let recent_items = records
        .iter()
        .skip(records.len().saturating_sub(RECENT_ITEMS))
        .map(|r| r.item.clone())
        .collect();

    Statistics {
        total_items: records.len(),
        distinct_locations,
        tag_counts,
        recent_items,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
