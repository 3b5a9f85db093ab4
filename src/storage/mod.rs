//! Key-value persistence
//!
//! Progress and profile are stored as string values under namespaced keys:
//! - `MemoryStore` keeps everything in a map (tests, ephemeral sessions)
//! - `JsonFileStore` writes one JSON object to disk on every change

// ============================================================
// Submodules
// ============================================================

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use thiserror::Error;

// ============================================================
// Errors
// ============================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("no data directory available")]
    NoDataDir,
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================
// Store trait
// ============================================================

pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;

    fn remove(&mut self, key: &str) -> StoreResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }
}

// ============================================================
// Keys
// ============================================================

/// Persisted key names under a namespace prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageKeys {
    pub current_level: String,
    pub level_progress: String,
    pub display_name: String,
    pub avatar_seed: String,
}

impl StorageKeys {
    pub fn new(namespace: &str) -> Self {
        Self {
            current_level: format!("{namespace}.current_level"),
            level_progress: format!("{namespace}.level_progress"),
            display_name: format!("{namespace}.profile.display_name"),
            avatar_seed: format!("{namespace}.profile.avatar_seed"),
        }
    }
}
