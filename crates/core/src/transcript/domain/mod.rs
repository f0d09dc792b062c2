pub mod chunk;
pub mod chunk_merger;
pub mod chunk_transcriber;
