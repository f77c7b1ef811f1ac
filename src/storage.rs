//! Local persistence: a scoped key-value store holding JSON documents.
//!
//! Two backends live under the data directory:
//!
//! ```text
//! <root>/
//!   tripHistory.json   # file backend: one JSON document per key
//!   tripid.sqlite      # sqlite backend: kv(key, value) table
//! ```
//!
//! The trip history is a single document under [`history::HISTORY_KEY`].

mod file;
mod history;
#[cfg(test)]
pub mod memory;
mod sqlite;

use std::io;
use std::path::PathBuf;

use serde::{Serialize, de::DeserializeOwned};

pub use file::FileStore;
#[cfg(test)]
pub use history::HISTORY_KEY;
pub use history::TripHistory;
pub use sqlite::SqliteStore;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid key {0:?}: use ASCII letters, digits, '-' or '_'")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// A device-scoped string store. Reads and writes are synchronous.
pub trait KeyValueStore {
    /// Returns the raw value under `key`, or `None` if it was never set.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Wipes every key in the store.
    fn clear(&self) -> Result<()>;
}

impl<K: KeyValueStore + ?Sized> KeyValueStore for Box<K> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// Typed JSON access on top of any [`KeyValueStore`].
pub trait JsonStore: KeyValueStore {
    /// Loads and decodes the value under `key`.
    ///
    /// A missing key yields `T::default()`. Decode failures are returned so
    /// the caller can decide whether corruption is recoverable.
    fn load_json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.get(key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(T::default()),
        }
    }

    /// Encodes `value` and stores it under `key`.
    fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.set(key, &json)
    }
}

impl<K: KeyValueStore + ?Sized> JsonStore for K {}

/// Which backend to open under the data directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    File,
    Sqlite,
}

/// Opens the configured backend rooted at `root`, creating it if needed.
pub fn open(backend: Backend, root: impl Into<PathBuf>) -> Result<Box<dyn KeyValueStore>> {
    let root = root.into();
    match backend {
        Backend::File => Ok(Box::new(FileStore::new(root)?)),
        Backend::Sqlite => Ok(Box::new(SqliteStore::open(root)?)),
    }
}

/// Keys double as file names, so they are restricted to a safe alphabet.
fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
