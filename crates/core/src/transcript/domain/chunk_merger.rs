use crate::shared::sentence::split_sentences;
use crate::shared::settings::MergeSettings;
use crate::shared::similarity::similarity_ratio;
use crate::shared::warning::Warning;

use super::chunk::Chunk;

/// Result of merging a job's chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub text: String,
    /// Chunks whose restated overlap was cut out.
    pub spliced: usize,
    /// Chunks appended whole because no confident splice point was found.
    pub appended: usize,
    pub warnings: Vec<Warning>,
}

/// Joins overlapping chunk transcripts into one text, collapsing each
/// restated overlap exactly once.
///
/// For every new chunk, the last few sentences of the accumulated text are
/// compared against the sentences at the head of the chunk. When the best
/// pair clears the threshold and something follows it, only the text after
/// the matched sentence is appended. Otherwise the whole chunk is appended,
/// so low confidence never drops content.
pub struct ChunkMerger {
    settings: MergeSettings,
}

impl ChunkMerger {
    pub fn new(settings: MergeSettings) -> Self {
        Self { settings }
    }

    pub fn merge(&self, chunks: &[Chunk]) -> String {
        self.merge_with_report(chunks).text
    }

    pub fn merge_with_report(&self, chunks: &[Chunk]) -> MergeOutcome {
        let (ordered, warnings) = order_chunks(chunks);
        let mut merged = String::new();
        let mut spliced = 0;
        let mut appended = 0;

        for chunk in ordered {
            let next = chunk.text().trim();
            if next.is_empty() {
                continue;
            }
            if merged.is_empty() {
                merged.push_str(next);
                continue;
            }

            merged.push(' ');
            match self.find_splice(&merged, next) {
                Some(offset) => {
                    merged.push_str(&next[offset..]);
                    spliced += 1;
                }
                None => {
                    merged.push_str(next);
                    appended += 1;
                }
            }
        }

        MergeOutcome {
            text: collapse_whitespace(&merged),
            spliced,
            appended,
            warnings,
        }
    }

    /// Byte offset in `next` where genuinely new content starts, if a
    /// confident overlap was found.
    fn find_splice(&self, accumulated: &str, next: &str) -> Option<usize> {
        let tail = tail_chars(accumulated, self.settings.window_chars);
        let head = head_chars(next, self.settings.window_chars);
        let prev_sentences = split_sentences(tail);
        let next_sentences = split_sentences(head);
        if prev_sentences.is_empty() || next_sentences.is_empty() {
            return None;
        }

        let anchor_count = self.settings.anchor_sentences.max(1);
        let anchors = &prev_sentences[prev_sentences.len().saturating_sub(anchor_count)..];

        // (ratio, anchor index, next sentence index). Ties go to the later
        // anchor, which sits closest to the true splice point.
        let mut best: Option<(f64, usize, usize)> = None;
        for (a, anchor) in anchors.iter().enumerate() {
            for (j, candidate) in next_sentences.iter().enumerate() {
                let ratio = similarity_ratio(anchor.text, candidate.text);
                if ratio <= self.settings.threshold {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((r, best_anchor, _)) => {
                        ratio > r || ((ratio - r).abs() < f64::EPSILON && a > best_anchor)
                    }
                };
                if better {
                    best = Some((ratio, a, j));
                }
            }
        }

        let (ratio, _, matched) = best?;
        let following = next_sentences.get(matched + 1)?;
        log::debug!(
            "Overlap found at sentence {matched} (ratio {ratio:.2}); splicing at byte {}",
            following.start
        );
        Some(following.start)
    }
}

impl Default for ChunkMerger {
    fn default() -> Self {
        Self::new(MergeSettings::default())
    }
}

/// Sort by index and drop repeated indices, reporting both.
fn order_chunks(chunks: &[Chunk]) -> (Vec<&Chunk>, Vec<Warning>) {
    let mut warnings = Vec::new();
    let mut ordered: Vec<&Chunk> = chunks.iter().collect();
    if ordered.windows(2).any(|w| w[0].index() > w[1].index()) {
        log::warn!("Chunks arrived out of order; sorting by index");
        warnings.push(Warning::ChunksReordered);
        ordered.sort_by_key(|c| c.index());
    }

    let mut unique: Vec<&Chunk> = Vec::with_capacity(ordered.len());
    for chunk in ordered {
        if unique.last().is_some_and(|last| last.index() == chunk.index()) {
            log::warn!("Duplicate chunk index {}; ignoring later copy", chunk.index());
            warnings.push(Warning::DuplicateChunkIndex {
                index: chunk.index(),
            });
            continue;
        }
        unique.push(chunk);
    }
    (unique, warnings)
}

fn tail_chars(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    let start = text
        .char_indices()
        .nth(skip)
        .map_or(text.len(), |(i, _)| i);
    &text[start..]
}

fn head_chars(text: &str, max_chars: usize) -> &str {
    let end = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(i, _)| i);
    &text[..end]
}

/// Collapse runs of spaces and tabs within each line. Line breaks are kept
/// since marker and exact-line dedup work per line; blank lines are dropped.
fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk::new(index, text, 5.0, 60.0).unwrap()
    }

    fn merger() -> ChunkMerger {
        ChunkMerger::default()
    }

    #[rstest]
    #[case::english(
        "The market opened higher today.",
        "Investors remain cautious about rates.",
        "The market opened higher today. Investors remain cautious about rates."
    )]
    #[case::thai(
        "ตลาดหุ้นไทยวันนี้ผันผวน",
        "นักลงทุนต่างชาติขายสุทธิ",
        "ตลาดหุ้นไทยวันนี้ผันผวน นักลงทุนต่างชาติขายสุทธิ"
    )]
    #[case::messy_whitespace(
        "  first   part\n\nof text ",
        "\tsecond  part ",
        "first part\nof text second part"
    )]
    fn test_non_overlapping_chunks_are_concatenated(
        #[case] a: &str,
        #[case] b: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(merger().merge(&[chunk(0, a), chunk(1, b)]), expected);
    }

    #[test]
    fn test_line_breaks_inside_chunks_survive() {
        let a = "SET ปิดบวก 10 จุด\n[DUP] SET ปิดบวก 10 จุด";
        let b = "KBANK  ทรงตัว\r\nPTT ปิดที่ 35 บาท";
        let merged = merger().merge(&[chunk(0, a), chunk(1, b)]);
        assert_eq!(
            merged.lines().collect::<Vec<_>>(),
            vec![
                "SET ปิดบวก 10 จุด",
                "[DUP] SET ปิดบวก 10 จุด KBANK ทรงตัว",
                "PTT ปิดที่ 35 บาท",
            ]
        );
    }

    #[test]
    fn test_restated_thai_overlap_appears_once() {
        let a = "ตลาดวันนี้ผันผวน SET ปิดบวก AOT ปรับตัวขึ้น แนวรับ 105 บาท";
        let b = "AOT ปรับตัวขึ้น แนวรับ 105 บาท KBANK ทรงตัว";
        let merged = merger().merge(&[chunk(0, a), chunk(1, b)]);

        assert_eq!(merged.matches("AOT ปรับตัวขึ้น แนวรับ 105 บาท").count(), 1);
        assert_eq!(merged.matches("KBANK ทรงตัว").count(), 1);
        assert!(merged.ends_with("KBANK ทรงตัว"));
    }

    #[test]
    fn test_noisy_retranscription_is_spliced() {
        let a = "Markets were quiet this morning. The central bank held rates steady today.";
        let b = "the central bank held rate steady today. Bond yields fell sharply.";
        let outcome = merger().merge_with_report(&[chunk(0, a), chunk(1, b)]);

        assert_eq!(
            outcome.text,
            "Markets were quiet this morning. The central bank held rates steady today. Bond yields fell sharply."
        );
        assert_eq!(outcome.spliced, 1);
        assert_eq!(outcome.appended, 0);
    }

    #[test]
    fn test_match_on_last_sentence_appends_everything() {
        let a = "Earlier remarks here. Alpha beta gamma delta.";
        let b = "Alpha beta gamma delta.";
        let outcome = merger().merge_with_report(&[chunk(0, a), chunk(1, b)]);

        assert_eq!(outcome.text.matches("Alpha beta gamma delta.").count(), 2);
        assert_eq!(outcome.appended, 1);
    }

    #[test]
    fn test_only_overlap_inside_tail_window_is_considered() {
        let settings = MergeSettings {
            window_chars: 40,
            ..MergeSettings::default()
        };
        let a = "Repeated opening sentence here. Then a long stretch of unrelated narration follows.";
        let b = "Repeated opening sentence here. Fresh content.";
        let merged = ChunkMerger::new(settings).merge(&[chunk(0, a), chunk(1, b)]);

        assert_eq!(merged.matches("Repeated opening sentence here.").count(), 2);
    }

    #[test]
    fn test_three_chunks_merge_in_sequence() {
        let chunks = vec![
            chunk(0, "PTT ปิดที่ 35 บาท"),
            chunk(1, "PTT ปิดที่ 35 บาท DELTA ยืนเหนือ 200 บาท"),
            chunk(2, "DELTA ยืนเหนือ 200 บาท ADVANC แนวรับ 300 บาท"),
        ];
        let merged = merger().merge(&chunks);
        assert_eq!(
            merged,
            "PTT ปิดที่ 35 บาท DELTA ยืนเหนือ 200 บาท ADVANC แนวรับ 300 บาท"
        );
    }

    #[test]
    fn test_out_of_order_chunks_are_sorted_with_warning() {
        let outcome =
            merger().merge_with_report(&[chunk(1, "second part."), chunk(0, "first part.")]);
        assert_eq!(outcome.text, "first part. second part.");
        assert_eq!(outcome.warnings, vec![Warning::ChunksReordered]);
    }

    #[test]
    fn test_duplicate_index_is_ignored_with_warning() {
        let outcome = merger().merge_with_report(&[
            chunk(0, "one."),
            chunk(0, "one again."),
            chunk(1, "two."),
        ]);
        assert_eq!(outcome.text, "one. two.");
        assert_eq!(
            outcome.warnings,
            vec![Warning::DuplicateChunkIndex { index: 0 }]
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(merger().merge(&[]), "");
        assert_eq!(merger().merge(&[chunk(0, "  "), chunk(1, "text")]), "text");
    }

    #[test]
    fn test_window_helpers_respect_char_boundaries() {
        assert_eq!(tail_chars("กขคง", 2), "คง");
        assert_eq!(head_chars("กขคง", 3), "กขค");
        assert_eq!(tail_chars("ab", 10), "ab");
    }
}
