use crate::shared::retry::ProviderError;

/// One search result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
}

/// Domain interface for a web search service used as a last-resort lookup.
///
/// Implementations bound every call with a timeout and draw from the job's
/// request budget.
pub trait SearchProvider: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError>;
}

/// Domain interface for confirming that a candidate ticker really trades.
pub trait TickerVerifier: Send + Sync {
    fn exists(&self, ticker: &str) -> Result<bool, ProviderError>;
}
