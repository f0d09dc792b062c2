pub mod alias_store;
pub mod category_classifier;
pub mod context_strategy;
pub mod entity;
pub mod entity_resolver;
pub mod exact_strategy;
pub mod external_lookup_strategy;
pub mod fuzzy_strategy;
pub mod knowledge_base;
pub mod resolution_strategy;
pub mod search_provider;
