//! JSON file-backed key-value store with write-through saves.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StoreError, StoreResult};

const DEFAULT_FILE_NAME: &str = "progress.json";

/// One JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "opened store");
        Ok(Self { path, entries })
    }

    /// Like [`open`](Self::open), but a corrupt file is logged and replaced by an empty store.
    pub fn open_or_reset(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        match Self::open(path.clone()) {
            Err(StoreError::Serde(err)) => {
                tracing::warn!(path = %path.display(), error = %err, "store file unreadable, starting empty");
                Ok(Self {
                    path,
                    entries: BTreeMap::new(),
                })
            }
            other => other,
        }
    }

    /// `<data_dir>/<namespace>/progress.json`.
    pub fn default_path(namespace: &str) -> StoreResult<PathBuf> {
        let base = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
        Ok(base.join(namespace).join(DEFAULT_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&self.entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        if self.entries.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
