use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access store file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store file {path} is not a JSON object: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("stored value for key {key} is not a list")]
    NotAList { key: String },
    #[error("failed to encode value for key {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub struct KvStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, Value>,
}

impl KvStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "store opened");
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Typed read of `key`, or `default` when absent or not decodable as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(value) = self.entries.get(key) else {
            return default;
        };
        match serde_json::from_value(value.clone()) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring malformed stored value");
                default
            }
        }
    }

    /// Decode the list under `key` element by element, skipping the
    /// elements that are not a `T`.
    pub fn get_each<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.entries.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(|v| decode(key, v)).collect(),
            Some(_) => {
                tracing::warn!(key, "ignoring stored value that is not a list");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// The raw elements of the list under `key`, for read-modify-write.
    ///
    /// Absent is an empty list. Any other non-list value is an error, so a
    /// write never replaces data that could not be read.
    pub fn list_values(&self, key: &str) -> Result<Vec<Value>, StoreError> {
        match self.entries.get(key) {
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(_) => Err(StoreError::NotAList {
                key: key.to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Write `value` under `key` and flush the whole store to disk.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let text = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            StoreError::Encode {
                key: "*".to_string(),
                source,
            }
        })?;

        // Write-then-rename so a crash never leaves a half-written store.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}

/// Decode one stored list element, logging and skipping it on failure.
pub fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(key, error = %e, "skipping undecodable list entry");
            None
        }
    }
}

/// Encode one list element for `key`.
pub fn encode<T: Serialize>(key: &str, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })
}
