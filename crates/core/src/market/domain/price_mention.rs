use regex::Regex;

use crate::shared::pattern::compile;

const MIN_PRICE: f64 = 0.1;
const MAX_PRICE: f64 = 10_000.0;

/// A spoken `TICKER ... <price> บาท` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMention {
    pub ticker: String,
    pub price: f64,
    /// Byte span of the whole statement in the source text.
    pub start: usize,
    pub end: usize,
}

pub struct PriceMentionExtractor {
    pattern: Option<Regex>,
}

impl Default for PriceMentionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceMentionExtractor {
    pub fn new() -> Self {
        // Text between ticker and price may not hold digits, capitals or a
        // line break, so a statement never borrows another ticker's price.
        // Prices may group thousands with commas.
        Self {
            pattern: compile(
                r"\b([A-Z]{2,5})\b[^\dA-Z\n]{0,40}?((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?)\s*บาท",
            ),
        }
    }

    pub fn extract(&self, text: &str) -> Vec<PriceMention> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };
        pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let ticker = caps.get(1)?.as_str().to_string();
                let price: f64 = caps.get(2)?.as_str().replace(',', "").parse().ok()?;
                (MIN_PRICE..=MAX_PRICE).contains(&price).then_some(PriceMention {
                    ticker,
                    price,
                    start: whole.start(),
                    end: whole.end(),
                })
            })
            .collect()
    }
}
