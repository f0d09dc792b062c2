pub mod constants;
pub mod json_store;
pub mod pattern;
pub mod retry;
pub mod sentence;
pub mod settings;
pub mod similarity;
pub mod warning;
