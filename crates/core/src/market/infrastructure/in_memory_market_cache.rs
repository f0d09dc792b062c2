use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Duration, NaiveDate, Utc};

use crate::market::domain::market_cache::MarketCache;
use crate::market::domain::market_cache_entry::{CacheStats, MarketCacheEntry};
use crate::shared::constants::DEFAULT_MARKET_TTL_HOURS;
use crate::shared::json_store::StoreError;

/// Process-local market cache; nothing survives the process.
pub struct InMemoryMarketCache {
    ttl: Duration,
    entries: Mutex<HashMap<(String, NaiveDate), MarketCacheEntry>>,
}

impl InMemoryMarketCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryMarketCache {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_MARKET_TTL_HOURS))
    }
}

impl MarketCache for InMemoryMarketCache {
    fn get(&self, ticker: &str, date: NaiveDate) -> Option<MarketCacheEntry> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(&(ticker.to_string(), date))
            .filter(|e| e.is_fresh(Utc::now(), self.ttl))
            .cloned()
    }

    fn set(&self, entry: MarketCacheEntry) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert((entry.ticker.clone(), entry.date), entry);
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, StoreError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = entries.len();
        let now = Utc::now();
        entries.retain(|_, e| e.is_fresh(now, self.ttl));
        Ok(before - entries.len())
    }

    fn stats(&self) -> CacheStats {
        self.entries
            .lock()
            .map(|e| CacheStats::tally(e.values(), Utc::now(), self.ttl))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::domain::market_cache_entry::PriceRange;

    fn entry(ticker: &str, age_hours: i64) -> MarketCacheEntry {
        MarketCacheEntry {
            ticker: ticker.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            price_range: PriceRange { low: 1.0, high: 2.0 },
            close: 1.5,
            fetched_at: Utc::now() - Duration::hours(age_hours),
        }
    }

    #[test]
    fn test_expired_entry_reads_as_absent_until_purged() {
        let cache = InMemoryMarketCache::default();
        cache.set(entry("AOT", 25)).unwrap();
        cache.set(entry("PTT", 1)).unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert!(cache.get("AOT", date).is_none());
        assert!(cache.get("PTT", date).is_some());
        assert_eq!(cache.stats().expired, 1);

        assert_eq!(cache.purge_expired().unwrap(), 1);
        assert_eq!(cache.stats().total, 1);
    }
}
