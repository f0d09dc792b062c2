use std::sync::Arc;

use crate::shared::settings::ResolverSettings;
use crate::shared::similarity::alias_key;
use crate::shared::warning::Warning;

use super::alias_store::AliasStore;
use super::context_strategy::ContextStrategy;
use super::entity::{Mention, Resolution, UnresolvedReason};
use super::exact_strategy::ExactStrategy;
use super::external_lookup_strategy::ExternalLookupStrategy;
use super::fuzzy_strategy::FuzzyStrategy;
use super::knowledge_base::KnowledgeBase;
use super::resolution_strategy::{ResolutionState, ResolutionStrategy};

/// Outcome of one `resolve` call plus anything worth surfacing.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveReport {
    pub resolution: Resolution,
    pub persisted: bool,
    pub warnings: Vec<Warning>,
}

/// Maps a spoken mention to a canonical ticker by running an ordered
/// cascade of strategies, first success wins.
///
/// Results at or above the persistence floor are written to the alias
/// store, so the next lookup of the same mention ends at the exact stage.
pub struct EntityResolver {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
    aliases: Arc<dyn AliasStore>,
    persistence_floor: f64,
}

impl EntityResolver {
    pub fn new(
        strategies: Vec<Box<dyn ResolutionStrategy>>,
        aliases: Arc<dyn AliasStore>,
        persistence_floor: f64,
    ) -> Self {
        Self {
            strategies,
            aliases,
            persistence_floor,
        }
    }

    /// Exact, context and fuzzy stages, plus external lookup when given.
    pub fn standard(
        knowledge_base: Arc<KnowledgeBase>,
        aliases: Arc<dyn AliasStore>,
        settings: ResolverSettings,
        external: Option<ExternalLookupStrategy>,
    ) -> Self {
        let mut strategies: Vec<Box<dyn ResolutionStrategy>> = vec![
            Box::new(ExactStrategy::new(aliases.clone(), knowledge_base.clone())),
            Box::new(ContextStrategy::new(knowledge_base.clone(), settings.clone())),
            Box::new(FuzzyStrategy::new(knowledge_base, settings.clone())),
        ];
        if let Some(external) = external {
            strategies.push(Box::new(external));
        }
        Self::new(strategies, aliases, settings.persistence_floor)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn resolve(&self, mention: &Mention) -> Resolution {
        self.resolve_with_report(mention).resolution
    }

    pub fn resolve_with_report(&self, mention: &Mention) -> ResolveReport {
        if mention.text.trim().is_empty() {
            return ResolveReport {
                resolution: Resolution::Unresolved {
                    mention: mention.text.clone(),
                    reason: UnresolvedReason::EmptyMention,
                },
                persisted: false,
                warnings: Vec::new(),
            };
        }

        let mut state = ResolutionState::default();
        for strategy in &self.strategies {
            let Some(resolution) = strategy.resolve(mention, &mut state) else {
                continue;
            };
            log::debug!("'{}' settled by {} stage", mention.text, strategy.name());
            let mut warnings = Vec::new();
            let persisted = self.persist(&resolution, &mut warnings);
            return ResolveReport {
                resolution,
                persisted,
                warnings,
            };
        }

        ResolveReport {
            resolution: Resolution::Unresolved {
                mention: mention.text.clone(),
                reason: state.rejection.unwrap_or(UnresolvedReason::NoCandidate),
            },
            persisted: false,
            warnings: Vec::new(),
        }
    }

    /// Cache a confident mapping unless the store already holds it.
    fn persist(&self, resolution: &Resolution, warnings: &mut Vec<Warning>) -> bool {
        let Some(entity) = resolution.entity() else {
            return false;
        };
        if entity.confidence < self.persistence_floor {
            return false;
        }
        let key = alias_key(&entity.mention);
        let current = self.aliases.get(&key);
        if key.is_empty() || current.as_deref() == Some(entity.canonical_ticker.as_str()) {
            return false;
        }
        match self.aliases.put(&key, &entity.canonical_ticker) {
            Ok(()) => {
                log::info!("Cached alias '{key}' -> {}", entity.canonical_ticker);
                true
            }
            Err(e) => {
                log::warn!("Failed to cache alias '{key}': {e}");
                warnings.push(Warning::CacheWriteFailed {
                    detail: e.to_string(),
                });
                false
            }
        }
    }
}
