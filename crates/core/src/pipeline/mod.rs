pub mod consolidate_transcript_use_case;
pub mod job_services;
pub mod pipeline_logger;
pub mod resolve_mentions_use_case;
pub mod validate_prices_use_case;
