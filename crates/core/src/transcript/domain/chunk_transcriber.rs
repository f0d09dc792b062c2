use super::chunk::ChunkWindow;

/// Domain interface for speech-to-text over one planned audio window.
///
/// Implementations call the external speech service; they must bound every
/// call with a timeout so a stuck request never stalls the pool.
pub trait ChunkTranscriber: Send + Sync {
    fn transcribe(
        &self,
        window: &ChunkWindow,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}
