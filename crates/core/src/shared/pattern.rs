use regex::Regex;

/// Compile a built-in pattern. A pattern that fails to compile is logged and
/// treated as matching nothing.
pub fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .map_err(|e| log::error!("Invalid pattern {pattern}: {e}"))
        .ok()
}

pub fn is_match(re: &Option<Regex>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}
