use std::sync::Arc;

use chrono::NaiveDate;

use crate::shared::warning::Warning;

use super::market_cache_entry::MarketCacheEntry;
use super::market_data_service::MarketDataService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// Inside the day's low/high range.
    High,
    /// Outside the range but within tolerance of the close.
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Plausibility {
    Plausible { confidence: Confidence, deviation: f64 },
    Implausible { deviation: f64 },
    /// No market data to compare against.
    Unknown,
}

impl Plausibility {
    /// `Some(true|false)` when data was available, `None` when unknown.
    pub fn is_plausible(&self) -> Option<bool> {
        match self {
            Plausibility::Plausible { .. } => Some(true),
            Plausibility::Implausible { .. } => Some(false),
            Plausibility::Unknown => None,
        }
    }

    pub fn deviation(&self) -> Option<f64> {
        match self {
            Plausibility::Plausible { deviation, .. } | Plausibility::Implausible { deviation } => {
                Some(*deviation)
            }
            Plausibility::Unknown => None,
        }
    }
}

/// Compare a stated price with one day's market data.
///
/// Deviation is relative to the close.
pub fn assess(entry: &MarketCacheEntry, stated: f64, tolerance: f64) -> Plausibility {
    if entry.close <= 0.0 || !entry.close.is_finite() {
        return Plausibility::Unknown;
    }
    let deviation = (stated - entry.close).abs() / entry.close;
    if entry.price_range.contains(stated) {
        Plausibility::Plausible {
            confidence: Confidence::High,
            deviation,
        }
    } else if deviation <= tolerance {
        Plausibility::Plausible {
            confidence: Confidence::Medium,
            deviation,
        }
    } else {
        Plausibility::Implausible { deviation }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceCheck {
    pub ticker: String,
    pub stated: f64,
    pub date: NaiveDate,
    pub plausibility: Plausibility,
    pub market: Option<MarketCacheEntry>,
    pub warnings: Vec<Warning>,
}

/// Checks spoken prices against cached or fetched market data. Never
/// corrects anything; implausible and unverifiable prices become warnings.
pub struct PriceValidator {
    market: Arc<MarketDataService>,
    tolerance: f64,
}

impl PriceValidator {
    pub fn new(market: Arc<MarketDataService>, tolerance: f64) -> Self {
        Self { market, tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn check(&self, ticker: &str, stated: f64, date: NaiveDate) -> PriceCheck {
        self.is_plausible(ticker, stated, date, self.tolerance)
    }

    pub fn is_plausible(
        &self,
        ticker: &str,
        stated: f64,
        date: NaiveDate,
        tolerance: f64,
    ) -> PriceCheck {
        let outcome = self.market.quote(ticker, date);
        let mut warnings = outcome.warnings;
        let plausibility = match &outcome.entry {
            Some(entry) => assess(entry, stated, tolerance),
            None => Plausibility::Unknown,
        };

        match (&plausibility, &outcome.entry) {
            (Plausibility::Implausible { deviation }, Some(entry)) => {
                log::warn!(
                    "{ticker}: stated {stated:.2} vs close {:.2} on {date}",
                    entry.close
                );
                warnings.push(Warning::ImplausiblePrice {
                    ticker: entry.ticker.clone(),
                    stated,
                    close: entry.close,
                    deviation: *deviation,
                });
            }
            (Plausibility::Unknown, _) => warnings.push(Warning::PriceUnavailable {
                ticker: ticker.to_string(),
            }),
            _ => {}
        }

        PriceCheck {
            ticker: ticker.to_string(),
            stated,
            date,
            plausibility,
            market: outcome.entry,
            warnings,
        }
    }
}
