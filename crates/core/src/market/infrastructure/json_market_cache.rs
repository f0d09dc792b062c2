use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::market::domain::market_cache::MarketCache;
use crate::market::domain::market_cache_entry::{CacheStats, MarketCacheEntry, PriceRange};
use crate::shared::constants::MARKET_CACHE_FILE_NAME;
use crate::shared::json_store::{default_store_path, read_document, write_document, StoreError};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct DayData {
    low: f64,
    high: f64,
    close: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredEntry {
    data: DayData,
    fetched_at: DateTime<Utc>,
}

type Document = BTreeMap<String, StoredEntry>;

fn entry_key(ticker: &str, date: NaiveDate) -> String {
    format!("{ticker}_{}", date.format(DATE_FORMAT))
}

fn to_entry(key: &str, stored: &StoredEntry) -> Option<MarketCacheEntry> {
    let (ticker, date) = key.rsplit_once('_')?;
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
    Some(MarketCacheEntry {
        ticker: ticker.to_string(),
        date,
        price_range: PriceRange {
            low: stored.data.low,
            high: stored.data.high,
        },
        close: stored.data.close,
        fetched_at: stored.fetched_at,
    })
}

/// Market cache persisted as one JSON object keyed `"<ticker>_<YYYY-MM-DD>"`,
/// each value `{"data": {"low", "high", "close"}, "fetched_at"}`.
///
/// Writes re-read the file and replace it atomically under one lock.
/// Expired entries stay on disk until overwritten or purged.
pub struct JsonMarketCache {
    path: PathBuf,
    ttl: Duration,
    entries: Mutex<Document>,
}

impl JsonMarketCache {
    /// Open the cache at `path`. A missing file is an empty cache; a file
    /// that exists but cannot be parsed is `StoreError::Corrupt`.
    pub fn open(path: impl Into<PathBuf>, ttl: Duration) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = load_document(&path)?;
        log::info!(
            "Loaded {} market cache entries from {}",
            entries.len(),
            path.display()
        );
        Ok(Self {
            path,
            ttl,
            entries: Mutex::new(entries),
        })
    }

    pub fn open_default(ttl: Duration) -> Result<Self, StoreError> {
        Self::open(default_store_path(MARKET_CACHE_FILE_NAME)?, ttl)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every entry regardless of age, in key order.
    pub fn entries(&self) -> Vec<MarketCacheEntry> {
        self.entries
            .lock()
            .map(|doc| doc.iter().filter_map(|(k, v)| to_entry(k, v)).collect())
            .unwrap_or_default()
    }
}

impl MarketCache for JsonMarketCache {
    fn get(&self, ticker: &str, date: NaiveDate) -> Option<MarketCacheEntry> {
        let key = entry_key(ticker, date);
        let entries = self.entries.lock().ok()?;
        let entry = to_entry(&key, entries.get(&key)?)?;
        if entry.is_fresh(Utc::now(), self.ttl) {
            Some(entry)
        } else {
            log::debug!("Market cache entry {key} expired");
            None
        }
    }

    fn set(&self, entry: MarketCacheEntry) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut on_disk = load_document(&self.path)?;
        on_disk.insert(
            entry_key(&entry.ticker, entry.date),
            StoredEntry {
                data: DayData {
                    low: entry.price_range.low,
                    high: entry.price_range.high,
                    close: entry.close,
                },
                fetched_at: entry.fetched_at,
            },
        );
        write_document(&self.path, &on_disk)?;
        *entries = on_disk;
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize, StoreError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut on_disk = load_document(&self.path)?;
        let before = on_disk.len();
        let now = Utc::now();
        on_disk.retain(|_, stored| now - stored.fetched_at < self.ttl);
        let removed = before - on_disk.len();
        if removed > 0 {
            write_document(&self.path, &on_disk)?;
            log::info!("Purged {removed} expired market cache entries");
        }
        *entries = on_disk;
        Ok(removed)
    }

    fn stats(&self) -> CacheStats {
        CacheStats::tally(&self.entries(), Utc::now(), self.ttl)
    }
}

/// Entries whose key does not parse are dropped with a warning; the rest
/// of the document is still usable.
fn load_document(path: &Path) -> Result<Document, StoreError> {
    let mut doc: Document = read_document(path)?.unwrap_or_default();
    doc.retain(|key, stored| {
        let valid = to_entry(key, stored).is_some();
        if !valid {
            log::warn!("Ignoring market cache entry with malformed key '{key}'");
        }
        valid
    });
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn entry(ticker: &str, d: u32, age_hours: i64) -> MarketCacheEntry {
        MarketCacheEntry {
            ticker: ticker.to_string(),
            date: day(d),
            price_range: PriceRange {
                low: 100.0 + f64::from(d),
                high: 110.0 + f64::from(d),
            },
            close: 105.0 + f64::from(d),
            fetched_at: Utc::now() - Duration::hours(age_hours),
        }
    }

    fn open(path: &Path) -> JsonMarketCache {
        JsonMarketCache::open(path, Duration::hours(24)).unwrap()
    }

    #[test]
    fn test_persist_then_reload_yields_same_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("market_data_cache.json");
        let cache = open(&path);
        let written = [entry("AOT", 2, 0), entry("AOT", 3, 0), entry("PTT", 2, 0), entry("BH_R", 4, 0)];
        for e in &written {
            cache.set(e.clone()).unwrap();
        }

        let reloaded = open(&path);
        assert_eq!(reloaded.entries().len(), written.len());
        for e in &written {
            assert_eq!(reloaded.get(&e.ticker, e.date).as_ref(), Some(e));
        }
    }

    #[test]
    fn test_document_format_is_human_editable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache.json");
        open(&path).set(entry("AOT", 2, 0)).unwrap();

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let value = &json["AOT_2026-03-02"];
        assert_eq!(value["data"]["low"], 102.0);
        assert_eq!(value["data"]["close"], 107.0);
        assert!(value["fetched_at"].is_string());
    }

    #[test]
    fn test_expired_entry_is_absent_but_kept_until_purge() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache.json");
        let cache = open(&path);
        cache.set(entry("AOT", 2, 30)).unwrap();
        cache.set(entry("PTT", 2, 1)).unwrap();

        assert!(cache.get("AOT", day(2)).is_none());
        assert_eq!(
            cache.stats(),
            CacheStats {
                total: 2,
                fresh: 1,
                expired: 1
            }
        );

        assert_eq!(cache.purge_expired().unwrap(), 1);
        assert_eq!(open(&path).entries().len(), 1);
    }

    #[test]
    fn test_refresh_overwrites_stale_entry() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache.json");
        let cache = open(&path);
        cache.set(entry("AOT", 2, 30)).unwrap();
        cache.set(entry("AOT", 2, 0)).unwrap();
        assert!(cache.get("AOT", day(2)).is_some());
        assert_eq!(cache.entries().len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache.json");
        fs::write(&path, "{\"AOT_2026-03-02\": {").unwrap();
        assert!(matches!(
            JsonMarketCache::open(&path, Duration::hours(24)),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_malformed_key_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache.json");
        fs::write(
            &path,
            r#"{"AOT-yesterday": {"data": {"low": 1, "high": 2, "close": 1.5}, "fetched_at": "2026-03-02T00:00:00Z"}}"#,
        )
        .unwrap();
        assert!(open(&path).entries().is_empty());
    }
}
