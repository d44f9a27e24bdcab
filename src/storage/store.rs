//! Key-value game state.
//!
//! String keys, JSON-encoded values, one file per key. Writes are
//! synchronous and fire-and-forget, last write wins; there is no schema
//! versioning. A malformed value is an error the call site turns into a
//! default; a broken save must never make the game unplayable.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Errors from the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error for key '{key}': {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },

    #[error("malformed value for key '{key}': {source}")]
    Parse {
        key: String,
        source: serde_json::Error,
    },

    #[error("serialize failed for key '{key}': {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },
}

/// Parse a raw JSON value.
pub fn parse<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(raw)
}

/// File-backed key-value store.
#[derive(Debug, Clone)]
pub struct KvStore {
    dir: PathBuf,
}

impl KvStore {
    /// Open (and create) the store directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Read and parse a value. `Ok(None)` when the key was never written;
    /// `Err` when the stored value is unreadable or malformed; callers
    /// default in that case.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
            key: key.to_string(),
            source,
        })?;

        parse(&raw)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                key: key.to_string(),
                source,
            })
    }

    /// Read a value, swallowing any error into the given default.
    ///
    /// This is the load path for game state: malformed persistence is
    /// accepted data loss, never a crash.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.get(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                tracing::warn!("discarding persisted state: {}", e);
                default
            }
        }
    }

    /// Write a value.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        std::fs::write(self.key_path(key), raw).map_err(|source| StoreError::Io {
            key: key.to_string(),
            source,
        })
    }

    /// Remove a key entirely.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.key_path(key);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|source| StoreError::Io {
                key: key.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPosition;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path()).unwrap();

        let pos = GeoPosition::new(9.1422, 49.9769);
        store.put("position", &pos).unwrap();

        let loaded: GeoPosition = store.get("position").unwrap().unwrap();
        assert!((loaded.lng - pos.lng).abs() < 1e-12);
    }

    #[test]
    fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path()).unwrap();

        let loaded: Option<GeoPosition> = store.get("position").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_malformed_value_defaults_at_call_site() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path()).unwrap();

        std::fs::write(dir.path().join("position.json"), "{not json!").unwrap();

        let result: Result<Option<GeoPosition>, _> = store.get("position");
        assert!(result.is_err());

        let fallback = store.get_or("position", GeoPosition::new(1.0, 2.0));
        assert!((fallback.lng - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path()).unwrap();

        store.put("position", &GeoPosition::new(1.0, 1.0)).unwrap();
        store.put("position", &GeoPosition::new(2.0, 2.0)).unwrap();

        let loaded: GeoPosition = store.get("position").unwrap().unwrap();
        assert!((loaded.lng - 2.0).abs() < 1e-12);
    }
}
