//! File-backed store: one JSON object of string values per origin.
//!
//! Writes go to a sibling temp file that is renamed over the target, so a
//! crash mid-write leaves either the old or the new contents on disk.

#[cfg(test)]
#[path = "file_test.rs"]
mod file_test;

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{KeyValueStore, StoreError};

type Entries = BTreeMap<String, String>;

pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    /// Store scoped to `origin` (e.g. `127.0.0.1:3000`) inside `dir`.
    #[must_use]
    pub fn for_origin(dir: &Path, origin: &str) -> Self {
        Self::new(dir.join(format!("{}.json", origin_file_stem(origin))))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Entries, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(source) => return Err(StoreError::Io { path: self.path.clone(), source }),
        };
        if raw.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt { path: self.path.clone(), message: e.to_string() })
    }

    /// Entries for a mutation, plus whether a corrupt file was discarded to get them.
    /// A corrupt file is replaced rather than blocking writes.
    fn entries_for_update(&self) -> Result<(Entries, bool), StoreError> {
        match self.read_entries() {
            Ok(entries) => Ok((entries, false)),
            Err(StoreError::Corrupt { path, message }) => {
                tracing::warn!(path = %path.display(), %message, "discarding corrupt store file");
                Ok((Entries::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let encoded = serde_json::to_string_pretty(entries).map_err(|e| StoreError::Encode(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encoded).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut entries, _) = self.entries_for_update()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut entries, discarded) = self.entries_for_update()?;
        if entries.remove(key).is_none() && !discarded {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}

/// File-name-safe form of an origin: anything but `[A-Za-z0-9.-]` becomes `_`.
pub(crate) fn origin_file_stem(origin: &str) -> String {
    let stem: String = origin
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    if stem.is_empty() { "default".to_owned() } else { stem }
}
