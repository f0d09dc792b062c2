use crate::shared::json_store::StoreError;

/// Domain interface for the persistent `alias -> canonical ticker` cache.
///
/// Keys are normalized alias keys. One key maps to at most one ticker; a
/// later `put` for the same key replaces the earlier mapping in place.
pub trait AliasStore: Send + Sync {
    fn get(&self, alias_key: &str) -> Option<String>;

    fn put(&self, alias_key: &str, ticker: &str) -> Result<(), StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
