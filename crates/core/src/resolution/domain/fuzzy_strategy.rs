use std::collections::HashMap;
use std::sync::Arc;

use crate::shared::settings::ResolverSettings;
use crate::shared::similarity::{alias_key, is_latin_only, similarity_ratio};

use super::entity::{Category, Mention, Resolution, ResolvedEntity, Source, UnresolvedReason};
use super::knowledge_base::{KbEntry, KnowledgeBase};
use super::resolution_strategy::{ResolutionState, ResolutionStrategy};

/// Best similarity per ticker among knowledge-base keys, highest first.
/// Only entries accepted by `filter` are considered.
pub(crate) fn rank_candidates<'a>(
    knowledge_base: &'a KnowledgeBase,
    mention_key: &str,
    filter: impl Fn(&KbEntry) -> bool,
) -> Vec<(&'a KbEntry, f64)> {
    let mut best: HashMap<&str, (&KbEntry, f64)> = HashMap::new();
    for (key, entry) in knowledge_base.keys() {
        if !filter(entry) {
            continue;
        }
        let score = similarity_ratio(mention_key, key);
        best.entry(entry.ticker.as_str())
            .and_modify(|slot| {
                if score > slot.1 {
                    *slot = (entry, score);
                }
            })
            .or_insert((entry, score));
    }
    let mut ranked: Vec<(&KbEntry, f64)> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.1.total_cmp(&a.1)
            .then_with(|| a.0.ticker.cmp(&b.0.ticker))
    });
    ranked
}

/// Best-scoring knowledge-base alias by similarity, behind safety gates.
///
/// The only stage that can be confidently wrong, so it refuses rather than
/// guesses:
/// - a best candidate with a short ticker needs a perfect score; anything
///   less ends the cascade, and the runner-up is never promoted;
/// - a Latin-only mention needs the stricter Latin bound;
/// - every other mention needs the general bound;
/// - two different tickers within the ambiguity margin end the cascade as
///   ambiguous.
///
/// When context classified the mention as a stock, only stock entries are
/// candidates.
pub struct FuzzyStrategy {
    knowledge_base: Arc<KnowledgeBase>,
    settings: ResolverSettings,
}

impl FuzzyStrategy {
    pub fn new(knowledge_base: Arc<KnowledgeBase>, settings: ResolverSettings) -> Self {
        Self {
            knowledge_base,
            settings,
        }
    }

    fn required_score(&self, mention: &str) -> f64 {
        if is_latin_only(mention) {
            self.settings.latin_threshold
        } else {
            self.settings.general_threshold
        }
    }
}

impl ResolutionStrategy for FuzzyStrategy {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn resolve(&self, mention: &Mention, state: &mut ResolutionState) -> Option<Resolution> {
        let key = alias_key(&mention.text);
        let category = state.category;
        let ranked = rank_candidates(&self.knowledge_base, &key, |entry| {
            category != Category::Stock || entry.category == Category::Stock
        });
        let Some(&(best, score)) = ranked.first() else {
            state.rejection = Some(UnresolvedReason::NoCandidate);
            return None;
        };

        if best.ticker.chars().count() <= self.settings.short_ticker_len && score < 1.0 {
            log::debug!(
                "'{}' best matches short ticker {} at {score:.2}; exact match required",
                mention.text,
                best.ticker
            );
            return Some(Resolution::Unresolved {
                mention: mention.text.clone(),
                reason: UnresolvedReason::ShortTickerInexact {
                    ticker: best.ticker.clone(),
                    score,
                },
            });
        }

        let required = self.required_score(&mention.text);
        if score < required {
            state.rejection = Some(UnresolvedReason::BelowThreshold { score, required });
            return None;
        }

        if let Some(&(runner_up, runner_score)) = ranked.get(1) {
            if score - runner_score < self.settings.ambiguity_margin {
                let candidates = vec![best.ticker.clone(), runner_up.ticker.clone()];
                log::warn!(
                    "'{}' is ambiguous between {} ({score:.2}) and {} ({runner_score:.2})",
                    mention.text,
                    best.ticker,
                    runner_up.ticker
                );
                return Some(Resolution::Unresolved {
                    mention: mention.text.clone(),
                    reason: UnresolvedReason::Ambiguous { candidates },
                });
            }
        }

        Some(Resolution::Resolved(ResolvedEntity {
            mention: mention.text.clone(),
            canonical_ticker: best.ticker.clone(),
            category: best.category,
            confidence: score,
            source: Source::Phonetic,
        }))
    }
}
