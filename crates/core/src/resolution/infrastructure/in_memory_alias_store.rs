use std::collections::HashMap;
use std::sync::Mutex;

use crate::resolution::domain::alias_store::AliasStore;
use crate::shared::json_store::StoreError;

/// Alias store that lives only for the process; for tests and dry runs.
#[derive(Default)]
pub struct InMemoryAliasStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryAliasStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AliasStore for InMemoryAliasStore {
    fn get(&self, alias_key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(alias_key).cloned()
    }

    fn put(&self, alias_key: &str, ticker: &str) -> Result<(), StoreError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(alias_key.to_string(), ticker.to_string());
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.lock().map_or(0, |e| e.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let store = InMemoryAliasStore::new();
        store.put("thai", "TISCO").unwrap();
        store.put("thai", "THAI").unwrap();
        assert_eq!(store.get("thai").as_deref(), Some("THAI"));
        assert_eq!(store.len(), 1);
    }
}
