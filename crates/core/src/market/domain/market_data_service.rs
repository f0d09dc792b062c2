use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};

use crate::resolution::domain::search_provider::TickerVerifier;
use crate::shared::retry::{retry_with_backoff, ProviderError, RequestBudget, RetryPolicy};
use crate::shared::settings::MarketSettings;
use crate::shared::warning::Warning;

use super::market_cache::MarketCache;
use super::market_cache_entry::{cache_ticker, MarketCacheEntry, PriceRange};
use super::market_data_provider::MarketDataProvider;

/// Result of a cache-first price lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteOutcome {
    pub entry: Option<MarketCacheEntry>,
    pub from_cache: bool,
    pub warnings: Vec<Warning>,
}

impl QuoteOutcome {
    fn unavailable(warnings: Vec<Warning>) -> Self {
        Self {
            entry: None,
            from_cache: false,
            warnings,
        }
    }
}

/// Cache-first access to daily prices.
///
/// A fresh cache hit returns without any network call. A miss fetches a
/// window of several calendar days ending the day after the requested date
/// (weekends and holidays have no bar), keeps the last bar on or before that
/// date and writes it back. Provider failures degrade to "no data".
pub struct MarketDataService {
    cache: Arc<dyn MarketCache>,
    provider: Arc<dyn MarketDataProvider>,
    budget: Arc<RequestBudget>,
    policy: RetryPolicy,
    settings: MarketSettings,
}

impl MarketDataService {
    pub fn new(
        cache: Arc<dyn MarketCache>,
        provider: Arc<dyn MarketDataProvider>,
        budget: Arc<RequestBudget>,
        policy: RetryPolicy,
        settings: MarketSettings,
    ) -> Self {
        Self {
            cache,
            provider,
            budget,
            policy,
            settings,
        }
    }

    pub fn cache(&self) -> &Arc<dyn MarketCache> {
        &self.cache
    }

    pub fn quote(&self, ticker: &str, date: NaiveDate) -> QuoteOutcome {
        let ticker = cache_ticker(ticker);
        if let Some(entry) = self.cache.get(&ticker, date) {
            log::debug!("Market cache hit for {ticker} on {date}");
            return QuoteOutcome {
                entry: Some(entry),
                from_cache: true,
                warnings: Vec::new(),
            };
        }

        let entry = match self.fetch(&ticker, date) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                log::info!("No trading data for {ticker} on or before {date}");
                return QuoteOutcome::unavailable(Vec::new());
            }
            Err(ProviderError::BudgetExhausted { .. }) => {
                return QuoteOutcome::unavailable(vec![Warning::RequestBudgetExhausted {
                    skipped: 1,
                }]);
            }
            Err(e) => {
                log::warn!("Market data fetch for {ticker} failed: {e}");
                return QuoteOutcome::unavailable(Vec::new());
            }
        };

        let mut warnings = Vec::new();
        if let Err(e) = self.cache.set(entry.clone()) {
            log::warn!("Failed to cache market data for {ticker}: {e}");
            warnings.push(Warning::CacheWriteFailed {
                detail: e.to_string(),
            });
        }
        QuoteOutcome {
            entry: Some(entry),
            from_cache: false,
            warnings,
        }
    }

    fn symbol(&self, ticker: &str) -> String {
        if ticker.starts_with('^') {
            ticker.to_string()
        } else {
            format!("{ticker}{}", self.settings.symbol_suffix)
        }
    }

    fn fetch(&self, ticker: &str, date: NaiveDate) -> Result<Option<MarketCacheEntry>, ProviderError> {
        let symbol = self.symbol(ticker);
        let from = date - Duration::days(self.settings.lookback_days.max(1));
        let to = date + Duration::days(1);
        let bars = retry_with_backoff(&self.policy, &self.budget, || {
            self.provider.daily_bars(&symbol, from, to)
        })?;

        Ok(bars
            .iter()
            .filter(|bar| bar.date <= date)
            .max_by_key(|bar| bar.date)
            .map(|bar| MarketCacheEntry {
                ticker: ticker.to_string(),
                date,
                price_range: PriceRange {
                    low: bar.low,
                    high: bar.high,
                },
                close: bar.close,
                fetched_at: Utc::now(),
            }))
    }
}

impl TickerVerifier for MarketDataService {
    /// A ticker exists if the provider has recent trading data for it.
    fn exists(&self, ticker: &str) -> Result<bool, ProviderError> {
        let today = Utc::now().date_naive();
        let ticker = cache_ticker(ticker);
        if self.cache.get(&ticker, today).is_some() {
            return Ok(true);
        }
        match self.fetch(&ticker, today) {
            Ok(Some(entry)) => {
                if let Err(e) = self.cache.set(entry) {
                    log::warn!("Failed to cache market data for {ticker}: {e}");
                }
                Ok(true)
            }
            Ok(None) | Err(ProviderError::Status { status: 404, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
