use std::fmt;

/// Non-fatal findings surfaced for human or downstream-model review.
///
/// Components return these next to their best-effort output instead of
/// failing; nothing here ever aborts a job.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    ChunksReordered,
    DuplicateChunkIndex {
        index: usize,
    },
    ChunkTranscriptionFailed {
        index: usize,
        reason: String,
    },
    SafetyCeilingTripped {
        mode: &'static str,
        removal_fraction: f64,
        ceiling: f64,
    },
    MalformedMarker {
        line_number: usize,
        content: String,
    },
    KnowledgeBaseMalformed {
        detail: String,
    },
    UnresolvedMention {
        mention: String,
        reason: String,
    },
    AmbiguousMention {
        mention: String,
        candidates: Vec<String>,
    },
    PriceUnavailable {
        ticker: String,
    },
    ImplausiblePrice {
        ticker: String,
        stated: f64,
        close: f64,
        deviation: f64,
    },
    CacheWriteFailed {
        detail: String,
    },
    RequestBudgetExhausted {
        skipped: usize,
    },
    Cancelled {
        completed: usize,
        total: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ChunksReordered => write!(f, "chunks arrived out of order and were sorted"),
            Warning::DuplicateChunkIndex { index } => {
                write!(f, "duplicate chunk index {index}; later copy ignored")
            }
            Warning::ChunkTranscriptionFailed { index, reason } => {
                write!(f, "chunk {index} failed to transcribe: {reason}")
            }
            Warning::SafetyCeilingTripped {
                mode,
                removal_fraction,
                ceiling,
            } => write!(
                f,
                "{mode} dedup would remove {:.1}% of words (max {:.1}%); text kept unchanged",
                removal_fraction * 100.0,
                ceiling * 100.0
            ),
            Warning::MalformedMarker {
                line_number,
                content,
            } => write!(f, "malformed duplicate marker on line {line_number}: {content}"),
            Warning::KnowledgeBaseMalformed { detail } => {
                write!(f, "knowledge base malformed: {detail}")
            }
            Warning::UnresolvedMention { mention, reason } => {
                write!(f, "could not resolve '{mention}' ({reason})")
            }
            Warning::AmbiguousMention {
                mention,
                candidates,
            } => write!(
                f,
                "'{mention}' is ambiguous between {}",
                candidates.join(", ")
            ),
            Warning::PriceUnavailable { ticker } => {
                write!(f, "no market data available for {ticker}")
            }
            Warning::ImplausiblePrice {
                ticker,
                stated,
                close,
                deviation,
            } => write!(
                f,
                "{ticker}: stated price {stated:.2} deviates {:.1}% from close {close:.2}",
                deviation * 100.0
            ),
            Warning::CacheWriteFailed { detail } => write!(f, "cache write failed: {detail}"),
            Warning::RequestBudgetExhausted { skipped } => write!(
                f,
                "request budget exhausted; {skipped} external lookups skipped"
            ),
            Warning::Cancelled { completed, total } => {
                write!(f, "cancelled after {completed}/{total} items")
            }
        }
    }
}
