pub mod content_profile;
pub mod dedup_engine;
pub mod dedup_strategy;
pub mod exact_line_dedup;
pub mod marker_dedup;
pub mod quality;
pub mod sentence_dedup;
