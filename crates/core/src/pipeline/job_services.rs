use std::sync::Arc;

use chrono::Duration;
use thiserror::Error;

use crate::market::domain::market_cache::MarketCache;
use crate::market::domain::market_data_provider::MarketDataProvider;
use crate::market::domain::market_data_service::MarketDataService;
use crate::market::domain::price_validator::PriceValidator;
use crate::market::infrastructure::json_market_cache::JsonMarketCache;
use crate::market::infrastructure::yahoo_provider::YahooFinanceProvider;
use crate::resolution::domain::alias_store::AliasStore;
use crate::resolution::domain::entity_resolver::EntityResolver;
use crate::resolution::domain::external_lookup_strategy::ExternalLookupStrategy;
use crate::resolution::domain::knowledge_base::KnowledgeBase;
use crate::resolution::domain::search_provider::SearchProvider;
use crate::resolution::infrastructure::duckduckgo_search::DuckDuckGoSearch;
use crate::resolution::infrastructure::json_alias_store::JsonAliasStore;
use crate::shared::json_store::StoreError;
use crate::shared::retry::{ProviderError, RequestBudget};
use crate::shared::settings::Settings;
use crate::shared::warning::Warning;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] ProviderError),
}

/// The resolver and price validator for one job, sharing one request
/// budget and one market data service.
pub struct JobServices {
    pub resolver: Arc<EntityResolver>,
    pub market: Arc<MarketDataService>,
    pub validator: Arc<PriceValidator>,
    pub budget: Arc<RequestBudget>,
    /// Problems found while loading the knowledge base.
    pub warnings: Vec<Warning>,
}

impl JobServices {
    /// Wire the persistent stores and live providers named by `settings`.
    ///
    /// Only corrupt persisted state fails here; a missing knowledge base
    /// leaves the resolver with cache and fuzzy stages over an empty index.
    pub fn from_settings(settings: &Settings) -> Result<Self, SetupError> {
        let ttl = Duration::hours(settings.market.ttl_hours);
        let aliases: Arc<dyn AliasStore> = Arc::new(JsonAliasStore::open_default()?);
        let cache: Arc<dyn MarketCache> = Arc::new(JsonMarketCache::open_default(ttl)?);
        let provider: Arc<dyn MarketDataProvider> =
            Arc::new(YahooFinanceProvider::new(settings.external.timeout())?);
        let budget = Arc::new(RequestBudget::new(settings.request_budget));

        let search: Option<Arc<dyn SearchProvider>> = if settings.external.search_enabled {
            Some(Arc::new(DuckDuckGoSearch::new(
                settings.external.timeout(),
                settings.external.retry_policy(),
                budget.clone(),
            )?))
        } else {
            None
        };

        Ok(Self::with_components(
            settings, aliases, cache, provider, search, budget,
        ))
    }

    /// Wire caller-supplied stores and providers.
    pub fn with_components(
        settings: &Settings,
        aliases: Arc<dyn AliasStore>,
        cache: Arc<dyn MarketCache>,
        provider: Arc<dyn MarketDataProvider>,
        search: Option<Arc<dyn SearchProvider>>,
        budget: Arc<RequestBudget>,
    ) -> Self {
        let (knowledge_base, warnings) = load_knowledge_base(settings);

        let market = Arc::new(MarketDataService::new(
            cache,
            provider,
            budget.clone(),
            settings.external.retry_policy(),
            settings.market.clone(),
        ));
        let external = search.map(|search| {
            ExternalLookupStrategy::new(
                search,
                market.clone(),
                settings.external.search_query_suffix.clone(),
            )
        });
        let resolver = Arc::new(EntityResolver::standard(
            Arc::new(knowledge_base),
            aliases,
            settings.resolver.clone(),
            external,
        ));
        let validator = Arc::new(PriceValidator::new(market.clone(), settings.market.tolerance));
        log::info!("Resolver stages: {}", resolver.stage_names().join(" -> "));

        Self {
            resolver,
            market,
            validator,
            budget,
            warnings,
        }
    }
}

fn load_knowledge_base(settings: &Settings) -> (KnowledgeBase, Vec<Warning>) {
    let (mut knowledge_base, mut warnings) = match &settings.knowledge_base {
        Some(path) => KnowledgeBase::load(path),
        None => {
            log::info!("No knowledge base configured");
            (KnowledgeBase::empty(), Vec::new())
        }
    };
    if let Some(path) = &settings.finance_terms {
        warnings.extend(knowledge_base.merge_file(path));
    }
    log::info!("Knowledge base holds {} tickers", knowledge_base.len());
    (knowledge_base, warnings)
}
