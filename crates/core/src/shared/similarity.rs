/// Lowercases, trims and collapses internal whitespace so that ASR spacing
/// noise does not affect comparisons.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Symmetric character-level similarity in `[0, 1]`.
///
/// Built on normalized Levenshtein distance over Unicode scalar values, so
/// Thai text (no inter-word spaces, combining vowel marks) compares per
/// code point rather than per byte.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    strsim::normalized_levenshtein(&a, &b)
}

/// Key form used by alias lookups: normalized and stripped of ASCII
/// punctuation ("ปตท." and "ปตท" share a key).
pub fn alias_key(text: &str) -> String {
    normalize(text)
        .chars()
        .filter(|c| !c.is_ascii_punctuation() || *c == '&')
        .collect::<String>()
        .trim()
        .to_string()
}

/// True when the text consists only of ASCII letters and spaces, with at
/// least one letter.
pub fn is_latin_only(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty()
        && trimmed.chars().any(|c| c.is_ascii_alphabetic())
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == ' ')
}
