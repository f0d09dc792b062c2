use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::settings::cache_dir;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file exists but cannot be parsed. Fatal: silently starting from
    /// an empty store would discard every persisted mapping.
    #[error("persisted store {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize store for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Read a JSON document. A missing file is `Ok(None)`; an unreadable or
/// unparseable one is an error.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path).map_err(|e| StoreError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Write a JSON document so readers never observe a half-written file.
pub fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;

    // Write to a temp file first, then rename for atomicity
    let temp_path = path.with_extension("part");
    let mut file = fs::File::create(&temp_path).map_err(|e| StoreError::Write {
        path: temp_path.clone(),
        source: e,
    })?;
    file.write_all(json.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| StoreError::Write {
            path: temp_path.clone(),
            source: e,
        })?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| StoreError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Default location of a persisted cache file.
pub fn default_store_path(file_name: &str) -> Result<PathBuf, StoreError> {
    cache_dir()
        .map(|d| d.join(file_name))
        .ok_or(StoreError::NoCacheDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_as_none() {
        let tmp = TempDir::new().unwrap();
        let doc: Option<BTreeMap<String, String>> =
            read_document(&tmp.path().join("absent.json")).unwrap();
        assert!(doc.is_none());
    }

    #[test]
    fn test_write_then_read() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sub").join("store.json");
        let mut doc = BTreeMap::new();
        doc.insert("ปตท".to_string(), "PTT".to_string());
        write_document(&path, &doc).unwrap();

        assert_eq!(read_document(&path).unwrap(), Some(doc));
        assert!(!path.with_extension("part").exists());
    }

    #[test]
    fn test_unparseable_file_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.json");
        fs::write(&path, "{\"a\": ").unwrap();
        let result: Result<Option<BTreeMap<String, String>>, _> = read_document(&path);
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_default_store_path_is_under_app_dir() {
        if let Ok(path) = default_store_path("ticker_cache.json") {
            assert!(path.to_string_lossy().contains("FinScribe"));
        }
    }
}
