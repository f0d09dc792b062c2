use chrono::NaiveDate;

use crate::shared::retry::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub low: f64,
    pub high: f64,
    pub close: f64,
}

/// Domain interface for a live source of daily price history.
///
/// Implementations perform exactly one timeout-bounded request per call;
/// retrying and budgeting belong to the caller.
pub trait MarketDataProvider: Send + Sync {
    /// Daily bars for `symbol` between `from` and `to` inclusive, oldest first.
    fn daily_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyBar>, ProviderError>;
}
