use std::fmt;

use serde::Serialize;

/// Kind of financial instrument a mention refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Fund,
    Stock,
    Index,
    Crypto,
    Unknown,
}

impl Category {
    /// Category implied by a knowledge-base sector name.
    pub fn from_sector(sector: &str) -> Self {
        let sector = sector.to_lowercase();
        if sector.contains("fund") || sector.contains("กองทุน") {
            Category::Fund
        } else if sector.contains("index") || sector.contains("indic") || sector.contains("ดัชนี")
        {
            Category::Index
        } else if sector.contains("crypto") || sector.contains("คริปโต") {
            Category::Crypto
        } else {
            Category::Stock
        }
    }
}

/// Which cascade stage produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Source {
    Exact,
    Phonetic,
    Context,
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEntity {
    pub mention: String,
    pub canonical_ticker: String,
    pub category: Category,
    pub confidence: f64,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnresolvedReason {
    EmptyMention,
    NoCandidate,
    BelowThreshold { score: f64, required: f64 },
    ShortTickerInexact { ticker: String, score: f64 },
    Ambiguous { candidates: Vec<String> },
    NotConfirmed { candidate: String },
    BudgetExhausted,
    LookupFailed { detail: String },
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::EmptyMention => write!(f, "empty mention"),
            UnresolvedReason::NoCandidate => write!(f, "no candidate"),
            UnresolvedReason::BelowThreshold { score, required } => {
                write!(f, "best score {score:.2} below {required:.2}")
            }
            UnresolvedReason::ShortTickerInexact { ticker, score } => {
                write!(f, "short ticker {ticker} needs an exact match (score {score:.2})")
            }
            UnresolvedReason::Ambiguous { candidates } => {
                write!(f, "ambiguous between {}", candidates.join(", "))
            }
            UnresolvedReason::NotConfirmed { candidate } => {
                write!(f, "candidate {candidate} not confirmed")
            }
            UnresolvedReason::BudgetExhausted => write!(f, "request budget exhausted"),
            UnresolvedReason::LookupFailed { detail } => write!(f, "lookup failed: {detail}"),
        }
    }
}

/// Outcome of resolving one mention. `Unresolved` always leaves the
/// original text untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(ResolvedEntity),
    Unresolved {
        mention: String,
        reason: UnresolvedReason,
    },
}

impl Resolution {
    pub fn entity(&self) -> Option<&ResolvedEntity> {
        match self {
            Resolution::Resolved(entity) => Some(entity),
            Resolution::Unresolved { .. } => None,
        }
    }

    pub fn ticker(&self) -> Option<&str> {
        self.entity().map(|e| e.canonical_ticker.as_str())
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// A text span believed to name an instrument, with its surrounding text.
#[derive(Debug, Clone, PartialEq)]
pub struct Mention {
    pub text: String,
    pub context: String,
}

impl Mention {
    pub fn new(text: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: context.into(),
        }
    }

    /// Mention at byte range `start..end` of `source`, with up to
    /// `window_chars` characters of context on each side.
    pub fn in_text(source: &str, start: usize, end: usize, window_chars: usize) -> Self {
        let (before, after) = window_bounds(source, start, end, window_chars);
        Self::new(&source[start..end], &source[before..after])
    }

    /// The part of the context within `window_chars` characters of the
    /// first occurrence of the mention. The whole context when the mention
    /// does not occur in it.
    pub fn context_around(&self, window_chars: usize) -> &str {
        let text = self.text.trim();
        match self.context.find(text) {
            Some(start) if !text.is_empty() => {
                let (before, after) =
                    window_bounds(&self.context, start, start + text.len(), window_chars);
                &self.context[before..after]
            }
            _ => &self.context,
        }
    }
}

fn window_bounds(source: &str, start: usize, end: usize, window_chars: usize) -> (usize, usize) {
    if window_chars == 0 {
        return (start, end);
    }
    let before = source[..start]
        .char_indices()
        .rev()
        .nth(window_chars - 1)
        .map_or(0, |(i, _)| i);
    let after = source[end..]
        .char_indices()
        .nth(window_chars)
        .map_or(source.len(), |(i, _)| end + i);
    (before, after)
}
