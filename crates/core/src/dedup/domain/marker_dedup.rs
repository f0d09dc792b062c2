use regex::Regex;

use crate::shared::constants::DEFAULT_DUP_MARKER;
use crate::shared::warning::Warning;

use super::dedup_strategy::{DedupMode, DedupPass, DedupStrategy};

const MAX_EXAMPLES: usize = 5;

/// A line carrying the duplicate marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkedLine {
    /// 1-based.
    pub line_number: usize,
    pub content: String,
}

/// Marker census of a text, taken before stripping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkerReport {
    pub marked_lines: Vec<MarkedLine>,
    /// Up to five marked lines, for display.
    pub examples: Vec<String>,
    /// Lines with something that looks like the marker but is not it.
    pub malformed: Vec<MarkedLine>,
}

impl MarkerReport {
    pub fn count(&self) -> usize {
        self.marked_lines.len()
    }

    pub fn has_markers(&self) -> bool {
        !self.marked_lines.is_empty()
    }
}

/// Strips lines an upstream reviewer tagged with the reserved marker.
///
/// The protocol is line-oriented and exact: a line containing the marker
/// (case-sensitive) is dropped whole, and nothing else is compared. Variants
/// such as `[dup]` or `( DUP )` are never stripped; they are reported.
pub struct MarkerDedup {
    marker: String,
    near_miss: Option<Regex>,
}

impl MarkerDedup {
    pub fn new(marker: impl Into<String>) -> Self {
        let marker = marker.into();
        let near_miss = near_miss_pattern(&marker);
        Self { marker, near_miss }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn verify(&self, text: &str) -> MarkerReport {
        let mut report = MarkerReport::default();
        for (i, line) in text.split('\n').enumerate() {
            let entry = MarkedLine {
                line_number: i + 1,
                content: line.trim().to_string(),
            };
            if line.contains(&self.marker) {
                report.marked_lines.push(entry);
            } else if self.near_miss.as_ref().is_some_and(|re| re.is_match(line)) {
                report.malformed.push(entry);
            }
        }
        report.examples = report
            .marked_lines
            .iter()
            .take(MAX_EXAMPLES)
            .map(|m| m.content.clone())
            .collect();
        report
    }
}

impl Default for MarkerDedup {
    fn default() -> Self {
        Self::new(DEFAULT_DUP_MARKER)
    }
}

impl DedupStrategy for MarkerDedup {
    fn mode(&self) -> DedupMode {
        DedupMode::Marker
    }

    fn apply(&self, text: &str) -> DedupPass {
        if self.marker.is_empty() {
            return DedupPass::unchanged(text);
        }
        let report = self.verify(text);
        let warnings: Vec<Warning> = report
            .malformed
            .into_iter()
            .map(|m| {
                log::warn!("Malformed duplicate marker on line {}", m.line_number);
                Warning::MalformedMarker {
                    line_number: m.line_number,
                    content: m.content,
                }
            })
            .collect();

        if report.marked_lines.is_empty() {
            return DedupPass {
                text: text.to_string(),
                removed: 0,
                warnings,
            };
        }

        let kept: Vec<&str> = text
            .split('\n')
            .filter(|line| !line.contains(&self.marker))
            .collect();
        DedupPass {
            text: kept.join("\n"),
            removed: report.marked_lines.len(),
            warnings,
        }
    }
}

/// Case-insensitive bracketed form of the marker's word, e.g. `[dup]`,
/// `(DUP)`, `[ Dup ]` for `[DUP]`.
fn near_miss_pattern(marker: &str) -> Option<Regex> {
    let word = marker.trim_matches(|c: char| !c.is_alphanumeric());
    if word.is_empty() {
        return None;
    }
    Regex::new(&format!(r"(?i)[\[\(]\s*{}\s*[\]\)]", regex::escape(word))).ok()
}
