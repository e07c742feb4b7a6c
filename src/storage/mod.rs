//! Persisted key-value storage, the native analogue of browser local storage.
//!
//! DESIGN
//! ======
//! Values are opaque strings; callers own serialization. The trait is
//! synchronous because local storage is, and every caller treats it as
//! best-effort: failures are reported, never fatal.

pub mod file;
pub mod memory;

use std::path::PathBuf;

pub use file::FileStore;
pub use memory::MemoryStore;

pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but is not a JSON object of strings.
    #[error("store file {} is corrupt: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },

    /// The store could not serialize its contents.
    #[error("store encode failed: {0}")]
    Encode(String),
}
