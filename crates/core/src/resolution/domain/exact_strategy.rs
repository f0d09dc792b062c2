use std::sync::Arc;

use crate::shared::similarity::alias_key;

use super::alias_store::AliasStore;
use super::entity::{Category, Mention, Resolution, ResolvedEntity, Source};
use super::knowledge_base::{strip_suffix, KbEntry, KnowledgeBase};
use super::resolution_strategy::{ResolutionState, ResolutionStrategy};

/// Case-insensitive lookup in the alias cache, then in the knowledge base's
/// canonical tickers, then in its aliases. Cheapest and authoritative.
pub struct ExactStrategy {
    aliases: Arc<dyn AliasStore>,
    knowledge_base: Arc<KnowledgeBase>,
}

impl ExactStrategy {
    pub fn new(aliases: Arc<dyn AliasStore>, knowledge_base: Arc<KnowledgeBase>) -> Self {
        Self {
            aliases,
            knowledge_base,
        }
    }

    fn resolved(mention: &Mention, ticker: &str, category: Category) -> Resolution {
        Resolution::Resolved(ResolvedEntity {
            mention: mention.text.clone(),
            canonical_ticker: ticker.to_string(),
            category,
            confidence: 1.0,
            source: Source::Exact,
        })
    }

    fn from_entry(mention: &Mention, entry: &KbEntry) -> Resolution {
        Self::resolved(mention, &entry.ticker, entry.category)
    }
}

impl ResolutionStrategy for ExactStrategy {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn resolve(&self, mention: &Mention, _state: &mut ResolutionState) -> Option<Resolution> {
        let key = alias_key(&mention.text);

        if let Some(ticker) = self.aliases.get(&key) {
            let ticker = strip_suffix(&ticker);
            return Some(Self::resolved(
                mention,
                ticker,
                self.knowledge_base.category_of(ticker),
            ));
        }
        if let Some(entry) = self.knowledge_base.by_ticker(&mention.text) {
            return Some(Self::from_entry(mention, entry));
        }
        self.knowledge_base
            .by_alias(&key)
            .map(|entry| Self::from_entry(mention, entry))
    }
}
