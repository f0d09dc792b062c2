use std::sync::Arc;

use regex::Regex;

use crate::shared::pattern::compile;
use crate::shared::retry::ProviderError;

use super::entity::{Category, Mention, Resolution, ResolvedEntity, Source, UnresolvedReason};
use super::resolution_strategy::{ResolutionState, ResolutionStrategy};
use super::search_provider::{SearchHit, SearchProvider, TickerVerifier};

/// Below the persistence floor: a search hit is never cached on its own.
const EXTERNAL_CONFIDENCE: f64 = 0.85;

/// Uppercase words common in Thai market search results that are not tickers.
const IGNORED_WORDS: &[&str] = &[
    "SET", "MAI", "PCL", "LTD", "INC", "CO", "THE", "AND", "FOR", "THB", "USD", "ETF", "IPO",
    "CEO", "NEWS", "PDF", "HTML", "WWW", "COM", "SEC", "YOY", "QOQ", "EPS", "PE", "PBV",
];

/// Last resort: search the web for the mention, pull the first plausible
/// ticker out of the results and accept it only if the market data
/// provider confirms it trades.
pub struct ExternalLookupStrategy {
    search: Arc<dyn SearchProvider>,
    verifier: Arc<dyn TickerVerifier>,
    query_suffix: String,
    ticker_pattern: Option<Regex>,
}

impl ExternalLookupStrategy {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        verifier: Arc<dyn TickerVerifier>,
        query_suffix: impl Into<String>,
    ) -> Self {
        Self {
            search,
            verifier,
            query_suffix: query_suffix.into(),
            ticker_pattern: compile(r"\b[A-Z]{2,6}\b"),
        }
    }

    fn candidate(&self, hits: &[SearchHit]) -> Option<String> {
        let pattern = self.ticker_pattern.as_ref()?;
        hits.iter()
            .flat_map(|hit| [hit.title.as_str(), hit.snippet.as_str()])
            .flat_map(|text| pattern.find_iter(text))
            .map(|m| m.as_str())
            .find(|word| !IGNORED_WORDS.contains(word))
            .map(str::to_string)
    }
}

impl ResolutionStrategy for ExternalLookupStrategy {
    fn name(&self) -> &'static str {
        "external"
    }

    fn resolve(&self, mention: &Mention, state: &mut ResolutionState) -> Option<Resolution> {
        let query = format!("{} {}", mention.text.trim(), self.query_suffix);
        let hits = match self.search.search(&query) {
            Ok(hits) => hits,
            Err(e) => {
                state.rejection = Some(rejection_for(&e));
                return None;
            }
        };
        let Some(candidate) = self.candidate(&hits) else {
            state.rejection = Some(UnresolvedReason::NoCandidate);
            return None;
        };

        match self.verifier.exists(&candidate) {
            Ok(true) => {
                log::info!("'{}' resolved to {candidate} via search", mention.text);
                Some(Resolution::Resolved(ResolvedEntity {
                    mention: mention.text.clone(),
                    canonical_ticker: candidate,
                    category: Category::Stock,
                    confidence: EXTERNAL_CONFIDENCE,
                    source: Source::External,
                }))
            }
            Ok(false) => {
                state.rejection = Some(UnresolvedReason::NotConfirmed { candidate });
                None
            }
            Err(e) => {
                state.rejection = Some(rejection_for(&e));
                None
            }
        }
    }
}

fn rejection_for(error: &ProviderError) -> UnresolvedReason {
    match error {
        ProviderError::BudgetExhausted { .. } => UnresolvedReason::BudgetExhausted,
        other => {
            log::warn!("External lookup failed: {other}");
            UnresolvedReason::LookupFailed {
                detail: other.to_string(),
            }
        }
    }
}
