use std::sync::Arc;

use crate::shared::settings::ResolverSettings;
use crate::shared::similarity::alias_key;

use super::category_classifier::CategoryClassifier;
use super::entity::{Category, Mention, Resolution, ResolvedEntity, Source};
use super::fuzzy_strategy::rank_candidates;
use super::knowledge_base::KnowledgeBase;
use super::resolution_strategy::{ResolutionState, ResolutionStrategy};

/// Confidence for a fund mention kept as spoken. Below the persistence
/// floor, so it is reported but never cached.
const UNMATCHED_FUND_CONFIDENCE: f64 = 0.8;
const UNMATCHED_OTHER_CONFIDENCE: f64 = 0.7;

/// Classifies the mention from its context before any fuzzy matching.
///
/// Funds, indices and crypto are resolved only against entries of the same
/// category; with no match the mention is kept as spoken and the cascade
/// ends there, so a fund can never be rewritten into a similarly spelled
/// stock. Stock and unknown mentions pass on with the category recorded.
pub struct ContextStrategy {
    knowledge_base: Arc<KnowledgeBase>,
    classifier: CategoryClassifier,
    settings: ResolverSettings,
}

impl ContextStrategy {
    pub fn new(knowledge_base: Arc<KnowledgeBase>, settings: ResolverSettings) -> Self {
        Self {
            knowledge_base,
            classifier: CategoryClassifier::new(),
            settings,
        }
    }

    fn resolve_within(&self, mention: &Mention, category: Category) -> ResolvedEntity {
        let key = alias_key(&mention.text);
        let ranked = rank_candidates(&self.knowledge_base, &key, |e| e.category == category);

        match ranked.first() {
            Some(&(entry, score)) if score >= self.settings.general_threshold => ResolvedEntity {
                mention: mention.text.clone(),
                canonical_ticker: entry.ticker.clone(),
                category,
                confidence: score,
                source: Source::Context,
            },
            _ => ResolvedEntity {
                mention: mention.text.clone(),
                canonical_ticker: mention.text.trim().to_string(),
                category,
                confidence: if category == Category::Fund {
                    UNMATCHED_FUND_CONFIDENCE
                } else {
                    UNMATCHED_OTHER_CONFIDENCE
                },
                source: Source::Context,
            },
        }
    }
}

impl ResolutionStrategy for ContextStrategy {
    fn name(&self) -> &'static str {
        "context"
    }

    fn resolve(&self, mention: &Mention, state: &mut ResolutionState) -> Option<Resolution> {
        let context = mention.context_around(self.settings.context_window);
        let category = self.classifier.classify(&mention.text, context);
        state.category = category;
        match category {
            Category::Fund | Category::Index | Category::Crypto => {
                log::debug!("'{}' classified {category:?} from context", mention.text);
                Some(Resolution::Resolved(self.resolve_within(mention, category)))
            }
            Category::Stock | Category::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KB: &str = r#"{
        "Banking": {"TISCO": ["thai esc", "ทิสโก้"]},
        "Mutual Funds": {"KT-ESG": ["กรุงไทย อีเอสจี"]},
        "Market Indices": {"SET50": ["เซ็ทห้าสิบ"]}
    }"#;

    fn strategy() -> ContextStrategy {
        let (kb, _) = KnowledgeBase::from_json_str(KB);
        ContextStrategy::new(Arc::new(kb), ResolverSettings::default())
    }

    fn resolve(text: &str, context: &str) -> (Option<Resolution>, ResolutionState) {
        let mut state = ResolutionState::default();
        let result = strategy().resolve(&Mention::new(text, context), &mut state);
        (result, state)
    }

    #[test]
    fn test_unknown_fund_is_kept_as_spoken() {
        let (result, state) = resolve("THAI ESG", "ซื้อกองทุน THAI ESG ก่อนสิ้นปี");
        let entity = result.unwrap().entity().cloned().unwrap();
        assert_eq!(entity.canonical_ticker, "THAI ESG");
        assert_eq!(entity.category, Category::Fund);
        assert_eq!(entity.confidence, UNMATCHED_FUND_CONFIDENCE);
        assert_eq!(state.category, Category::Fund);
    }

    #[test]
    fn test_fund_matches_only_fund_entries() {
        let (result, _) = resolve("กรุงไทย อีเอสจี", "กองทุน กรุงไทย อีเอสจี");
        assert_eq!(result.unwrap().ticker(), Some("KT-ESG"));
    }

    #[test]
    fn test_index_mention_resolves_within_indices() {
        let (result, _) = resolve("เซ็ทห้าสิบ", "ดัชนี เซ็ทห้าสิบ ปิดบวก");
        let entity = result.unwrap().entity().cloned().unwrap();
        assert_eq!(entity.canonical_ticker, "SET50");
        assert_eq!(entity.source, Source::Context);
    }

    #[test]
    fn test_stock_context_passes_on_with_category() {
        let (result, state) = resolve("ทิสโก้", "หุ้น ทิสโก้ จ่ายปันผล");
        assert!(result.is_none());
        assert_eq!(state.category, Category::Stock);
    }

    #[test]
    fn test_indicator_outside_window_is_ignored() {
        let filler = "ตลาดเคลื่อนไหวในกรอบแคบ ".repeat(40);
        let context = format!("กองทุน {filler}ทิสโก้ ปรับตัวขึ้น");
        let (result, state) = resolve("ทิสโก้", &context);
        assert!(result.is_none());
        assert_eq!(state.category, Category::Unknown);

        let (result, _) = resolve("ทิสโก้", &format!("กองทุน ทิสโก้ {filler}"));
        assert_eq!(result.unwrap().entity().unwrap().category, Category::Fund);
    }

    #[test]
    fn test_no_indicator_passes_on() {
        let (result, state) = resolve("DELTA", "DELTA ทรงตัว");
        assert!(result.is_none());
        assert_eq!(state.category, Category::Unknown);
    }
}
