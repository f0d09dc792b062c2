use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::resolution::domain::alias_store::AliasStore;
use crate::shared::constants::ALIAS_CACHE_FILE_NAME;
use crate::shared::json_store::{default_store_path, read_document, write_document, StoreError};
use crate::shared::similarity::alias_key;

/// Alias cache persisted as a flat, human-editable JSON object
/// `{"alias": "TICKER"}`.
///
/// Every write re-reads the file, applies the change and writes the whole
/// document back atomically, all under one lock, so concurrent resolvers in
/// this process never lose each other's updates. Entries are never evicted.
pub struct JsonAliasStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonAliasStore {
    /// Open the store at `path`. A missing file is an empty store; a file
    /// that exists but cannot be parsed is `StoreError::Corrupt`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = load_entries(&path)?;
        log::info!("Loaded {} cached aliases from {}", entries.len(), path.display());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Open the store at its default location in the platform cache dir.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(default_store_path(ALIAS_CACHE_FILE_NAME)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .lock()
            .map(|e| e.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
}

impl AliasStore for JsonAliasStore {
    fn get(&self, alias_key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(alias_key).cloned()
    }

    fn put(&self, key: &str, ticker: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut on_disk = load_entries(&self.path)?;
        on_disk.insert(key.to_string(), ticker.to_string());
        write_document(&self.path, &on_disk)?;
        *entries = on_disk;
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.lock().map_or(0, |e| e.len())
    }
}

/// Keys are re-normalized on load so hand edits still match lookups.
fn load_entries(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
    let raw: BTreeMap<String, String> = read_document(path)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|(alias, ticker)| (alias_key(&alias), ticker))
        .filter(|(alias, _)| !alias.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_persist_then_reload_yields_same_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ticker_cache.json");
        let store = JsonAliasStore::open(&path).unwrap();
        let mappings = [("ปตท", "PTT"), ("กสิกร", "KBANK"), ("ทิสโก้", "TISCO"), ("ท่าอากาศยาน", "AOT")];
        for (alias, ticker) in mappings {
            store.put(alias, ticker).unwrap();
        }

        let reloaded = JsonAliasStore::open(&path).unwrap();
        assert_eq!(reloaded.len(), mappings.len());
        for (alias, ticker) in mappings {
            assert_eq!(reloaded.get(alias).as_deref(), Some(ticker));
        }
        assert_eq!(reloaded.entries(), store.entries());
    }

    #[test]
    fn test_rewrite_replaces_mapping_in_place() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ticker_cache.json");
        let store = JsonAliasStore::open(&path).unwrap();
        store.put("thai", "TISCO").unwrap();
        store.put("thai", "THAI").unwrap();

        let reloaded = JsonAliasStore::open(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get("thai").as_deref(), Some("THAI"));
    }

    #[test]
    fn test_corrupt_file_is_fatal_on_open() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ticker_cache.json");
        fs::write(&path, "not json at all").unwrap();
        assert!(matches!(
            JsonAliasStore::open(&path),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_hand_edited_keys_are_normalized() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ticker_cache.json");
        fs::write(&path, r#"{"  Delta  Electronics ": "DELTA"}"#).unwrap();
        let store = JsonAliasStore::open(&path).unwrap();
        assert_eq!(store.get("delta electronics").as_deref(), Some("DELTA"));
    }

    #[test]
    fn test_concurrent_writers_lose_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ticker_cache.json");
        let store = Arc::new(JsonAliasStore::open(&path).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..5 {
                        store.put(&format!("alias {t} {i}"), "PTT").unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(JsonAliasStore::open(&path).unwrap().len(), 20);
    }

    #[test]
    fn test_writes_merge_with_changes_made_on_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ticker_cache.json");
        let store = JsonAliasStore::open(&path).unwrap();
        fs::write(&path, r#"{"gulf": "GULF"}"#).unwrap();
        store.put("ปตท", "PTT").unwrap();
        assert_eq!(store.get("gulf").as_deref(), Some("GULF"));
        assert_eq!(store.len(), 2);
    }
}
