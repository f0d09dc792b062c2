pub mod dedup;
pub mod market;
pub mod pipeline;
pub mod resolution;
pub mod shared;
pub mod transcript;
