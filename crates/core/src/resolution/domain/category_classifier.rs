use regex::Regex;

use crate::shared::pattern::{compile, is_match};

use super::entity::Category;

/// Names that are indices regardless of context.
const INDEX_NAMES: &[&str] = &[
    "set",
    "set index",
    "set50",
    "set100",
    "mai",
    "dow jones",
    "nasdaq",
    "s&p 500",
];

/// Classifies the instrument type of a mention from indicator phrases in its
/// context window.
///
/// Precedence is fund, stock, index, crypto. A fund needs the Thai word
/// กองทุน or an explicit "mutual fund": a bare "fund" is usually "fund
/// flow" talk about stocks.
pub struct CategoryClassifier {
    fund: Option<Regex>,
    stock: Option<Regex>,
    index: Option<Regex>,
    crypto: Option<Regex>,
}

impl CategoryClassifier {
    pub fn new() -> Self {
        // Thai has no word boundaries, so Thai indicators match as substrings.
        Self {
            fund: compile(r"กองทุน|(?i:\bmutual\s*funds?\b)"),
            stock: compile(r"หุ้น|(?i:\b(?:stocks?|shares?)\b)"),
            index: compile(r"ดัชนี|(?i:\bindex\b|\bset\s*(?:index|50|100)\b)"),
            crypto: compile(r"คริปโต|บิทคอยน์|(?i:\b(?:crypto\w*|bitcoin|btc|ethereum)\b)"),
        }
    }

    pub fn classify(&self, mention: &str, context: &str) -> Category {
        if is_match(&self.fund, context) {
            return Category::Fund;
        }
        if is_match(&self.stock, context) {
            return Category::Stock;
        }
        let mention = mention.trim().to_lowercase();
        if is_match(&self.index, context) || INDEX_NAMES.contains(&mention.as_str()) {
            return Category::Index;
        }
        if is_match(&self.crypto, context) {
            return Category::Crypto;
        }
        Category::Unknown
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::new()
    }
}
