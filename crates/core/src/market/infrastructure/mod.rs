pub mod in_memory_market_cache;
pub mod json_market_cache;
pub mod yahoo_provider;
