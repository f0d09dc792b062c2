use std::collections::HashSet;

/// Heuristic quality of a sentence, used to pick which of two near-duplicates
/// survives. Higher is better.
///
/// Longer, punctuated, lexically varied sentences with numbers win over
/// truncated or stuttered copies. Position in the text plays no part.
pub fn quality_score(sentence: &str) -> f64 {
    let trimmed = sentence.trim();
    let mut score = trimmed.chars().count() as f64 * 0.1;

    if trimmed.ends_with(['.', '!', '?']) {
        score += 20.0;
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if !words.is_empty() {
        let unique: HashSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
        if unique.len() as f64 / words.len() as f64 > 0.8 {
            score += 10.0;
        }
    }

    if !trimmed.contains("...") && !trimmed.contains("???") {
        score += 5.0;
    }

    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        score += 3.0;
    }

    score
}
