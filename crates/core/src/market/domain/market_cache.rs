use chrono::NaiveDate;

use crate::shared::json_store::StoreError;

use super::market_cache_entry::{CacheStats, MarketCacheEntry};

/// Domain interface for the `(ticker, date)` price cache.
///
/// Expiry is lazy: `get` treats an entry older than the TTL as absent but
/// leaves it in place until it is overwritten or `purge_expired` runs.
pub trait MarketCache: Send + Sync {
    fn get(&self, ticker: &str, date: NaiveDate) -> Option<MarketCacheEntry>;

    fn set(&self, entry: MarketCacheEntry) -> Result<(), StoreError>;

    /// Drop expired entries, returning how many were removed.
    fn purge_expired(&self) -> Result<usize, StoreError>;

    fn stats(&self) -> CacheStats;
}
