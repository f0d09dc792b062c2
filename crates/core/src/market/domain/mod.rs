pub mod market_cache;
pub mod market_cache_entry;
pub mod market_data_provider;
pub mod market_data_service;
pub mod price_mention;
pub mod price_validator;
