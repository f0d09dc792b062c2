pub mod duckduckgo_search;
pub mod in_memory_alias_store;
pub mod json_alias_store;
