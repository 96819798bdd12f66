//! Key-value capability and its two backends.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// File name used to probe whether the data directory is writable.
const PROBE_KEY: &str = "__storage_probe__";

/// Minimal string key-value store.
///
/// Implementations never panic or raise: an unavailable store returns
/// `None` from reads and `false` from writes.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> bool;

    /// Remove `key`. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> bool;

    /// Whether the store currently accepts writes.
    fn is_available(&self) -> bool;
}

// ---------------------------------------------------------------------------
// MemoryKv
// ---------------------------------------------------------------------------

/// In-process store. Can be switched off to simulate a disabled host store.
#[derive(Debug)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, String>>,
    available: AtomicBool,
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle availability; while unavailable every operation fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        if !self.is_available() {
            return None;
        }
        self.entries.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        if !self.is_available() {
            return false;
        }
        match self.entries.write() {
            Ok(mut map) => {
                map.insert(key.to_string(), value.to_string());
                true
            }
            Err(_) => false,
        }
    }

    fn remove(&self, key: &str) -> bool {
        if !self.is_available() {
            return false;
        }
        match self.entries.write() {
            Ok(mut map) => {
                map.remove(key);
                true
            }
            Err(_) => false,
        }
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// FileKv
// ---------------------------------------------------------------------------

/// One file per key under a data directory.
///
/// Writes go to a sibling temp file and are renamed into place so a crash
/// never leaves a half-written collection behind.
#[derive(Debug, Clone)]
pub struct FileKv {
    dir: PathBuf,
}

impl FileKv {
    /// Use `dir` as the data directory, creating it if needed.
    ///
    /// A directory that cannot be created is not an error here; the store
    /// simply reports itself unavailable.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::error!(dir = %dir.display(), error = %e, "Failed to create data directory");
        }
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys map to file names, so only a conservative alphabet is accepted.
    fn path_for(&self, key: &str) -> Option<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            tracing::warn!(key, "Rejected invalid storage key");
            return None;
        }
        Some(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(s) => Some(s),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::error!(key, error = %e, "Storage read failed");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> bool {
        let Some(path) = self.path_for(key) else {
            return false;
        };
        let tmp = path.with_extension("json.tmp");
        let result = std::fs::write(&tmp, value).and_then(|()| std::fs::rename(&tmp, &path));
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key, error = %e, "Storage write failed");
                let _ = std::fs::remove_file(&tmp);
                false
            }
        }
    }

    fn remove(&self, key: &str) -> bool {
        let Some(path) = self.path_for(key) else {
            return false;
        };
        match std::fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => {
                tracing::error!(key, error = %e, "Storage remove failed");
                false
            }
        }
    }

    fn is_available(&self) -> bool {
        self.set(PROBE_KEY, PROBE_KEY) && self.remove(PROBE_KEY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
