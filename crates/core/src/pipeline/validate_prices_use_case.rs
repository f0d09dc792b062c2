use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;

use crate::market::domain::price_mention::PriceMentionExtractor;
use crate::market::domain::price_validator::{PriceCheck, PriceValidator};
use crate::shared::warning::Warning;

use super::pipeline_logger::PipelineLogger;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceReport {
    pub checks: Vec<PriceCheck>,
    pub warnings: Vec<Warning>,
}

impl PriceReport {
    pub fn implausible(&self) -> impl Iterator<Item = &PriceCheck> {
        self.checks
            .iter()
            .filter(|c| c.plausibility.is_plausible() == Some(false))
    }
}

/// Checks every `TICKER ... <price> บาท` statement in a transcript against
/// market data for the broadcast date. The text itself is never changed.
pub struct ValidatePricesUseCase {
    extractor: PriceMentionExtractor,
    validator: Arc<PriceValidator>,
    cancelled: Arc<AtomicBool>,
}

impl ValidatePricesUseCase {
    pub fn new(validator: Arc<PriceValidator>, cancelled: Option<Arc<AtomicBool>>) -> Self {
        Self {
            extractor: PriceMentionExtractor::new(),
            validator,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn execute(&self, text: &str, date: NaiveDate, logger: &mut dyn PipelineLogger) -> PriceReport {
        let started = Instant::now();
        let mentions = self.extractor.extract(text);
        let total = mentions.len();
        let mut checks = Vec::with_capacity(total);
        let mut warnings = Vec::new();
        let mut budget_skipped = 0;

        for mention in mentions {
            if self.cancelled.load(Ordering::Relaxed) {
                warnings.push(Warning::Cancelled {
                    completed: checks.len(),
                    total,
                });
                break;
            }
            let mut check = self.validator.check(&mention.ticker, mention.price, date);
            for warning in check.warnings.drain(..) {
                match warning {
                    Warning::RequestBudgetExhausted { skipped } => budget_skipped += skipped,
                    other => warnings.push(other),
                }
            }
            checks.push(check);
            logger.progress(checks.len(), total);
        }

        if budget_skipped > 0 {
            warnings.push(Warning::RequestBudgetExhausted {
                skipped: budget_skipped,
            });
        }

        logger.timing("validate-prices", started.elapsed().as_secs_f64() * 1000.0);
        let report = PriceReport { checks, warnings };
        logger.metric("implausible-prices", report.implausible().count() as f64);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::domain::market_cache::MarketCache;
    use crate::market::domain::market_cache_entry::{MarketCacheEntry, PriceRange};
    use crate::market::domain::market_data_provider::{DailyBar, MarketDataProvider};
    use crate::market::domain::market_data_service::MarketDataService;
    use crate::market::infrastructure::in_memory_market_cache::InMemoryMarketCache;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::retry::{ProviderError, RequestBudget, RetryPolicy};
    use crate::shared::settings::MarketSettings;
    use chrono::Utc;

    // ─── Stubs ───

    struct NoHistory;

    impl MarketDataProvider for NoHistory {
        fn daily_bars(&self, _: &str, _: NaiveDate, _: NaiveDate) -> Result<Vec<DailyBar>, ProviderError> {
            Ok(Vec::new())
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn use_case(budget: usize) -> ValidatePricesUseCase {
        let cache = Arc::new(InMemoryMarketCache::default());
        cache
            .set(MarketCacheEntry {
                ticker: "AOT".to_string(),
                date: date(),
                price_range: PriceRange {
                    low: 100.0,
                    high: 110.0,
                },
                close: 105.0,
                fetched_at: Utc::now(),
            })
            .unwrap();
        let service = MarketDataService::new(
            cache,
            Arc::new(NoHistory),
            Arc::new(RequestBudget::new(budget)),
            RetryPolicy::immediate(1),
            MarketSettings::default(),
        );
        ValidatePricesUseCase::new(Arc::new(PriceValidator::new(Arc::new(service), 0.15)), None)
    }

    #[test]
    fn test_implausible_price_is_flagged_not_corrected() {
        let text = "AOT แนวรับ 105 บาท ส่วนเป้าหมาย AOT 200 บาท";
        let report = use_case(5).execute(text, date(), &mut NullPipelineLogger);
        assert_eq!(report.checks.len(), 2);
        assert_eq!(report.implausible().count(), 1);
        assert!(matches!(
            report.warnings.as_slice(),
            [Warning::ImplausiblePrice { stated, .. }] if *stated == 200.0
        ));
    }

    #[test]
    fn test_unknown_ticker_reports_unavailable() {
        let report = use_case(5).execute("KBANK 150 บาท", date(), &mut NullPipelineLogger);
        assert!(matches!(
            report.warnings.as_slice(),
            [Warning::PriceUnavailable { ticker }] if ticker == "KBANK"
        ));
    }

    #[test]
    fn test_budget_skips_are_summed() {
        let report = use_case(0).execute("KBANK 150 บาท แล้ว PTT 34 บาท", date(), &mut NullPipelineLogger);
        assert_eq!(
            report
                .warnings
                .iter()
                .filter(|w| matches!(w, Warning::PriceUnavailable { .. }))
                .count(),
            2
        );
        assert_eq!(
            report.warnings.last(),
            Some(&Warning::RequestBudgetExhausted { skipped: 2 })
        );
    }
}
