use crate::shared::sentence::{split_sentences, Sentence};
use crate::shared::similarity::similarity_ratio;

use super::dedup_strategy::{rejoin, DedupMode, DedupPass, DedupStrategy};
use super::quality::quality_score;

/// Collapses near-identical neighbouring sentences, the typical artifact of a
/// chunk boundary the merger could not splice confidently.
///
/// Each sentence is compared with the next `lookahead` surviving sentences;
/// of a matching pair, the higher-quality one stays.
pub struct BoundaryDedup {
    threshold: f64,
    lookahead: usize,
}

impl BoundaryDedup {
    pub fn new(threshold: f64, lookahead: usize) -> Self {
        Self {
            threshold,
            lookahead: lookahead.max(1),
        }
    }
}

impl DedupStrategy for BoundaryDedup {
    fn mode(&self) -> DedupMode {
        DedupMode::Boundary
    }

    fn apply(&self, text: &str) -> DedupPass {
        let sentences = split_sentences(text);
        let scores: Vec<f64> = sentences.iter().map(|s| quality_score(s.text)).collect();
        let mut keep = vec![true; sentences.len()];

        for i in 0..sentences.len() {
            if !keep[i] {
                continue;
            }
            let end = (i + self.lookahead).min(sentences.len() - 1);
            for j in i + 1..=end {
                if !keep[j] {
                    continue;
                }
                if similarity_ratio(sentences[i].text, sentences[j].text) < self.threshold {
                    continue;
                }
                if scores[j] > scores[i] {
                    keep[i] = false;
                    break;
                }
                keep[j] = false;
            }
        }

        rebuild(text, &sentences, &keep)
    }
}

/// Groups similar sentences across the whole text and keeps the best
/// representative of each group at its own position.
pub struct GeneralDedup {
    threshold: f64,
}

impl GeneralDedup {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl DedupStrategy for GeneralDedup {
    fn mode(&self) -> DedupMode {
        DedupMode::General
    }

    fn apply(&self, text: &str) -> DedupPass {
        let sentences = split_sentences(text);
        let mut keep = vec![true; sentences.len()];
        let mut grouped = vec![false; sentences.len()];

        for i in 0..sentences.len() {
            if grouped[i] {
                continue;
            }
            let mut group = vec![i];
            for j in i + 1..sentences.len() {
                if !grouped[j]
                    && similarity_ratio(sentences[i].text, sentences[j].text) >= self.threshold
                {
                    group.push(j);
                }
            }
            if group.len() == 1 {
                continue;
            }

            // Earliest wins ties.
            let mut best = group[0];
            let mut best_score = quality_score(sentences[best].text);
            for &member in &group[1..] {
                let score = quality_score(sentences[member].text);
                if score > best_score {
                    best = member;
                    best_score = score;
                }
            }
            for &member in &group {
                grouped[member] = true;
                keep[member] = member == best;
            }
        }

        rebuild(text, &sentences, &keep)
    }
}

fn rebuild(text: &str, sentences: &[Sentence<'_>], keep: &[bool]) -> DedupPass {
    let removed = keep.iter().filter(|k| !**k).count();
    if removed == 0 {
        return DedupPass::unchanged(text);
    }
    let kept = sentences
        .iter()
        .zip(keep)
        .filter(|(_, k)| **k)
        .map(|(s, _)| s.text);
    DedupPass {
        text: rejoin(text, kept),
        removed,
        warnings: Vec::new(),
    }
}
