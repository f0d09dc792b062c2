use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use crate::dedup::domain::content_profile::ContentProfile;
use crate::dedup::domain::dedup_engine::DedupEngine;
use crate::dedup::domain::dedup_strategy::DedupMode;
use crate::shared::settings::Settings;
use crate::shared::warning::Warning;
use crate::transcript::domain::chunk::{Chunk, ChunkWindow};
use crate::transcript::domain::chunk_merger::ChunkMerger;
use crate::transcript::domain::chunk_transcriber::ChunkTranscriber;
use crate::transcript::infrastructure::pooled_transcriber::PooledTranscriber;

use super::pipeline_logger::PipelineLogger;

/// Passes run after merging when the caller names none. Marker mode is
/// prepended automatically whenever the text carries markers.
pub const DEFAULT_PASSES: [DedupMode; 2] = [DedupMode::ExactLine, DedupMode::Boundary];

#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedTranscript {
    pub text: String,
    pub chunks: usize,
    pub spliced: usize,
    pub appended: usize,
    /// Sentences and lines removed across all dedup passes.
    pub removed: usize,
    pub warnings: Vec<Warning>,
}

/// Turns a job's chunk transcripts into one clean transcript: merge the
/// overlaps, then run the dedup passes in order.
pub struct ConsolidateTranscriptUseCase {
    merger: ChunkMerger,
    engine: DedupEngine,
    passes: Vec<DedupMode>,
}

impl ConsolidateTranscriptUseCase {
    pub fn new(merger: ChunkMerger, engine: DedupEngine, passes: Vec<DedupMode>) -> Self {
        Self {
            merger,
            engine,
            passes,
        }
    }

    /// Build from settings, with dedup thresholds adjusted for the profile.
    pub fn from_settings(settings: &Settings, profile: ContentProfile) -> Self {
        Self::new(
            ChunkMerger::new(settings.merge.clone()),
            DedupEngine::new(&profile.apply(&settings.dedup)),
            DEFAULT_PASSES.to_vec(),
        )
    }

    pub fn execute(&self, chunks: &[Chunk], logger: &mut dyn PipelineLogger) -> ConsolidatedTranscript {
        let started = Instant::now();
        let merged = self.merger.merge_with_report(chunks);
        logger.timing("merge", elapsed_ms(started));
        logger.info(&format!(
            "Merged {} chunks ({} spliced, {} appended whole)",
            chunks.len(),
            merged.spliced,
            merged.appended
        ));

        let mut text = merged.text;
        let mut warnings = merged.warnings;
        let mut removed = 0;

        for mode in self.passes_for(&text) {
            let started = Instant::now();
            let outcome = self.engine.dedupe(&text, mode);
            logger.timing(&format!("dedup-{}", mode.as_str()), elapsed_ms(started));
            logger.metric(&format!("removed-{}", mode.as_str()), outcome.removed as f64);
            removed += outcome.removed;
            warnings.extend(outcome.warnings);
            text = outcome.text;
        }

        ConsolidatedTranscript {
            text,
            chunks: chunks.len(),
            spliced: merged.spliced,
            appended: merged.appended,
            removed,
            warnings,
        }
    }

    /// Transcribe every window on the pool, then consolidate. Chunks that
    /// failed or were skipped by cancellation are reported, and the rest
    /// are still merged.
    pub fn transcribe_and_execute(
        &self,
        pool: &PooledTranscriber,
        transcriber: Arc<dyn ChunkTranscriber>,
        windows: &[ChunkWindow],
        cancelled: Arc<AtomicBool>,
        logger: &mut dyn PipelineLogger,
    ) -> ConsolidatedTranscript {
        let started = Instant::now();
        let transcription = pool.transcribe_all(transcriber, windows, cancelled);
        logger.timing("transcribe", elapsed_ms(started));
        logger.progress(transcription.chunks.len(), windows.len());

        let mut result = self.execute(&transcription.chunks, logger);
        let mut warnings = transcription.warnings;
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        result
    }

    fn passes_for(&self, text: &str) -> Vec<DedupMode> {
        let mut passes = self.passes.clone();
        if !passes.contains(&DedupMode::Marker) && self.engine.marker().verify(text).has_markers() {
            passes.insert(0, DedupMode::Marker);
        }
        passes
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pipeline_logger::{LogPipelineLogger, NullPipelineLogger};
    use crate::transcript::domain::chunk::plan_chunks;

    // ─── Stubs ───

    struct ScriptedTranscriber {
        texts: Vec<&'static str>,
    }

    impl ChunkTranscriber for ScriptedTranscriber {
        fn transcribe(
            &self,
            window: &ChunkWindow,
        ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
            match self.texts.get(window.index) {
                Some(text) if !text.is_empty() => Ok(text.to_string()),
                _ => Err("provider returned nothing".into()),
            }
        }
    }

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk::new(index, text, if index == 0 { 0.0 } else { 10.0 }, 60.0).unwrap()
    }

    fn use_case() -> ConsolidateTranscriptUseCase {
        ConsolidateTranscriptUseCase::from_settings(&Settings::default(), ContentProfile::Default)
    }

    #[test]
    fn test_overlap_is_collapsed_once() {
        let chunks = [
            chunk(0, "ตลาดวันนี้ผันผวน AOT ปรับตัวขึ้น แนวรับ 105 บาท"),
            chunk(1, "AOT ปรับตัวขึ้น แนวรับ 105 บาท KBANK ทรงตัว"),
        ];
        let result = use_case().execute(&chunks, &mut NullPipelineLogger);
        assert_eq!(result.text.matches("AOT ปรับตัวขึ้น").count(), 1);
        assert_eq!(result.text.matches("KBANK ทรงตัว").count(), 1);
        assert_eq!(result.chunks, 2);
    }

    #[test]
    fn test_markers_trigger_marker_pass() {
        let chunks = [chunk(
            0,
            "SET index closes higher today.\n[DUP] SET index closes higher today.\nBanks led the gains across the board.\nEnergy names lagged behind the market.",
        )];
        let result = use_case().execute(&chunks, &mut NullPipelineLogger);
        assert!(!result.text.contains("[DUP]"));
        assert_eq!(result.removed, 1);
    }

    #[test]
    fn test_multi_line_transcript_keeps_its_lines() {
        let chunks = [chunk(
            0,
            "Markets closed higher.\n  Banks   led the gains across the board.\nEnergy names lagged behind the market.\nForeign investors were net buyers today.\nMarkets closed higher.\nBond yields edged lower after the auction.\nThe baht strengthened against the dollar.\nTech shares rebounded from early losses.\nVolume was thin ahead of the long holiday.",
        )];
        let result = use_case().execute(&chunks, &mut NullPipelineLogger);
        let lines: Vec<&str> = result.text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "Markets closed higher.");
        assert_eq!(lines[1], "Banks led the gains across the board.");
        assert_eq!(result.text.matches("Markets closed higher.").count(), 1);
        assert_eq!(result.removed, 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_logger_receives_stage_timings() {
        let mut logger = LogPipelineLogger::default();
        use_case().execute(&[chunk(0, "PTT ปิดบวก")], &mut logger);
        assert!(logger.timings_for("merge").is_some());
        assert!(logger.timings_for("dedup-boundary").is_some());
        assert_eq!(logger.metrics_for("removed-exact-line").unwrap(), &[0.0]);
    }

    #[test]
    fn test_failed_chunk_is_reported_and_rest_merged() {
        let windows = plan_chunks(150.0, 60.0, 10.0).unwrap();
        let transcriber = Arc::new(ScriptedTranscriber {
            texts: vec!["PTT ปิดบวก.", "", "KBANK ทรงตัว."],
        });
        let result = use_case().transcribe_and_execute(
            &PooledTranscriber::new(2),
            transcriber,
            &windows,
            Arc::new(AtomicBool::new(false)),
            &mut NullPipelineLogger,
        );
        assert_eq!(result.chunks, 2);
        assert!(result.text.contains("PTT ปิดบวก."));
        assert!(result.text.contains("KBANK ทรงตัว."));
        assert!(matches!(
            result.warnings.as_slice(),
            [Warning::ChunkTranscriptionFailed { index: 1, .. }]
        ));
    }
}
