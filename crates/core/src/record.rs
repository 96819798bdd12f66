//! Item records and recycle-bin entries.
//!
//! Both serialize in the camelCase shape used by the local store and by
//! export files (`{id, userId, item, location, createdAt, rawInput, source,
//! tags}`, plus `deletedAt` / `deleteReason` for bin entries).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{OwnerId, RecordId, Timestamp};

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// How the raw input that produced a record was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Text,
    Voice,
}

impl Source {
    /// Database / wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
        }
    }

    /// Parse from the wire name.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "text" => Ok(Self::Text),
            "voice" => Ok(Self::Voice),
            other => Err(CoreError::Validation(format!(
                "Unknown source '{other}'. Must be one of: text, voice"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ItemRecord
// ---------------------------------------------------------------------------

/// A tracked object and where it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: RecordId,
    #[serde(rename = "userId", alias = "ownerId")]
    pub owner_id: OwnerId,
    pub item: String,
    pub location: String,
    pub created_at: Timestamp,
    #[serde(default)]
    pub raw_input: String,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ItemRecord {
    /// Create a fresh record with a new UUIDv7 id and no tags.
    pub fn new(
        owner_id: impl Into<OwnerId>,
        item: impl Into<String>,
        location: impl Into<String>,
        raw_input: impl Into<String>,
        source: Source,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            owner_id: owner_id.into(),
            item: item.into(),
            location: location.into(),
            created_at,
            raw_input: raw_input.into(),
            source,
            tags: Vec::new(),
        }
    }

    /// Append `tag` unless an identical string is already present.
    ///
    /// Comparison is exact: tags differing only by case are distinct.
    /// Returns `true` if the tag was added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        if self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Case-insensitive substring match over item, location and raw input.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.item.to_lowercase().contains(&needle)
            || self.location.to_lowercase().contains(&needle)
            || self.raw_input.to_lowercase().contains(&needle)
    }

    /// Turn this record into a recycle-bin entry.
    pub fn into_bin_entry(self, reason: impl Into<String>, deleted_at: Timestamp) -> RecycleBinEntry {
        RecycleBinEntry {
            record: self,
            deleted_at,
            delete_reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// RecycleBinEntry
// ---------------------------------------------------------------------------

/// A soft-deleted record, recoverable until purged or swept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecycleBinEntry {
    #[serde(flatten)]
    pub record: ItemRecord,
    pub deleted_at: Timestamp,
    #[serde(default)]
    pub delete_reason: String,
}

impl RecycleBinEntry {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    /// Strip the deletion metadata and return the original record.
    pub fn into_record(self) -> ItemRecord {
        self.record
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
