//! Local persistence for ItemKeeper.
//!
//! [`KeyValueStore`] is the minimal get/set/remove capability the host
//! provides; [`RecordStore`] keeps the active collection, the recycle bin
//! and two metadata markers (schema version, last sync) on top of it.
//!
//! Nothing in this crate returns an error for storage failures: reads of an
//! unavailable or corrupt store yield empty collections and writes report
//! `false`, with the cause logged.

pub mod kv;
pub mod record_store;

pub use kv::{FileKv, KeyValueStore, MemoryKv};
pub use record_store::{ImportSummary, RecordStore, StorageInfo, SCHEMA_VERSION};
