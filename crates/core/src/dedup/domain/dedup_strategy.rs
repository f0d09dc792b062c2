use crate::shared::warning::Warning;

/// Which duplicate-removal strategy a dedup pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DedupMode {
    /// Near-identical neighbours within a short lookahead.
    Boundary,
    /// Near-identical sentences anywhere in the text.
    General,
    /// Exact repeated lines and bullets.
    ExactLine,
    /// Lines tagged with the reserved duplicate marker.
    Marker,
}

impl DedupMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DedupMode::Boundary => "boundary",
            DedupMode::General => "general",
            DedupMode::ExactLine => "exact-line",
            DedupMode::Marker => "marker",
        }
    }
}

/// Candidate output of one strategy, before the removal ceiling is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupPass {
    pub text: String,
    /// Sentences or lines dropped.
    pub removed: usize,
    pub warnings: Vec<Warning>,
}

impl DedupPass {
    pub fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            removed: 0,
            warnings: Vec::new(),
        }
    }
}

/// Domain interface for a duplicate-removal strategy.
///
/// Strategies only propose a rewrite; the engine decides whether the
/// proposal is safe to apply.
pub trait DedupStrategy: Send + Sync {
    fn mode(&self) -> DedupMode;

    fn apply(&self, text: &str) -> DedupPass;
}

/// Rejoin kept segments, preserving line structure when the source had any.
pub(crate) fn rejoin<'a>(source: &str, kept: impl Iterator<Item = &'a str>) -> String {
    let separator = if source.contains('\n') { "\n" } else { " " };
    kept.collect::<Vec<_>>().join(separator)
}
