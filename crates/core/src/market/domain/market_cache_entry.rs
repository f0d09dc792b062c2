use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub low: f64,
    pub high: f64,
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.low && price <= self.high
    }
}

/// One trading day's prices for a ticker, as cached in front of the
/// market data provider.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketCacheEntry {
    pub ticker: String,
    pub date: NaiveDate,
    pub price_range: PriceRange,
    pub close: f64,
    pub fetched_at: DateTime<Utc>,
}

impl MarketCacheEntry {
    /// Fresh while younger than `ttl`, measured from `fetched_at`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at < ttl
    }
}

/// Counts reported by `MarketCache::stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    pub fresh: usize,
    pub expired: usize,
}

impl CacheStats {
    pub fn tally<'a>(
        entries: impl IntoIterator<Item = &'a MarketCacheEntry>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        entries.into_iter().fold(Self::default(), |mut stats, entry| {
            stats.total += 1;
            if entry.is_fresh(now, ttl) {
                stats.fresh += 1;
            } else {
                stats.expired += 1;
            }
            stats
        })
    }
}

/// Cache tickers are stored upper-case without an exchange suffix.
pub fn cache_ticker(ticker: &str) -> String {
    let trimmed = ticker.trim();
    let base = trimmed
        .rsplit_once('.')
        .map_or(trimmed, |(base, _)| base);
    base.to_uppercase()
}
