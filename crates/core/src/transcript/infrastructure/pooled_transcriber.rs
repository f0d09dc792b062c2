use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::shared::constants::MAX_WORKERS;
use crate::shared::warning::Warning;
use crate::transcript::domain::chunk::{Chunk, ChunkWindow};
use crate::transcript::domain::chunk_transcriber::ChunkTranscriber;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type ChunkResult = (ChunkWindow, Result<String, String>);

/// Chunks transcribed for one job, in index order.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionOutcome {
    pub chunks: Vec<Chunk>,
    pub warnings: Vec<Warning>,
}

/// Runs chunk transcription on a bounded pool of worker threads.
///
/// Layout: `main [feed windows] → workers [transcribe] → main [collect]`
///
/// The pool size caps concurrent calls to the speech provider. Cancellation
/// is checked between chunks; calls already in flight finish or time out on
/// their own. The merger only runs once every chunk has come back.
pub struct PooledTranscriber {
    workers: usize,
    channel_capacity: usize,
}

impl PooledTranscriber {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.clamp(1, MAX_WORKERS),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn transcribe_all(
        &self,
        transcriber: Arc<dyn ChunkTranscriber>,
        windows: &[ChunkWindow],
        cancelled: Arc<AtomicBool>,
    ) -> TranscriptionOutcome {
        let (job_tx, job_rx) = crossbeam_channel::bounded::<ChunkWindow>(self.channel_capacity);
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<ChunkResult>();

        let handles: Vec<JoinHandle<()>> = (0..self.workers)
            .map(|_| {
                spawn_worker(
                    transcriber.clone(),
                    job_rx.clone(),
                    result_tx.clone(),
                    cancelled.clone(),
                )
            })
            .collect();
        drop(job_rx);
        drop(result_tx);

        for window in windows {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            if job_tx.send(window.clone()).is_err() {
                break;
            }
        }
        drop(job_tx);

        let mut results: Vec<ChunkResult> = result_rx.iter().collect();
        for handle in handles {
            if handle.join().is_err() {
                log::error!("Transcription worker panicked");
            }
        }

        results.sort_by_key(|(window, _)| window.index);
        collect_outcome(results, windows.len())
    }
}

impl Default for PooledTranscriber {
    fn default() -> Self {
        Self::new(crate::shared::constants::DEFAULT_WORKERS)
    }
}

fn spawn_worker(
    transcriber: Arc<dyn ChunkTranscriber>,
    job_rx: crossbeam_channel::Receiver<ChunkWindow>,
    result_tx: crossbeam_channel::Sender<ChunkResult>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for window in job_rx {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let result = transcriber
                .transcribe(&window)
                .map_err(|e| e.to_string());
            if result_tx.send((window, result)).is_err() {
                break;
            }
        }
    })
}

fn collect_outcome(results: Vec<ChunkResult>, total: usize) -> TranscriptionOutcome {
    let mut chunks = Vec::with_capacity(results.len());
    let mut warnings = Vec::new();
    let completed = results.len();

    for (window, result) in results {
        match result {
            Ok(text) => chunks.push(Chunk::from_window(&window, text)),
            Err(reason) => {
                log::warn!("Chunk {} failed to transcribe: {reason}", window.index);
                warnings.push(Warning::ChunkTranscriptionFailed {
                    index: window.index,
                    reason,
                });
            }
        }
    }

    if completed < total {
        warnings.push(Warning::Cancelled { completed, total });
    }

    TranscriptionOutcome { chunks, warnings }
}
