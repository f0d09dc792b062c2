use std::collections::HashSet;

use super::dedup_strategy::{DedupMode, DedupPass, DedupStrategy};

/// Removes lines whose content exactly repeats an earlier line.
///
/// Markdown bullets (`- text`) compare by their content, so a bullet and a
/// plain line saying the same thing count as repeats. Blank lines are kept.
pub struct ExactLineDedup;

impl DedupStrategy for ExactLineDedup {
    fn mode(&self) -> DedupMode {
        DedupMode::ExactLine
    }

    fn apply(&self, text: &str) -> DedupPass {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut kept: Vec<&str> = Vec::new();
        let mut removed = 0;
        let mut previous: Option<&str> = None;
        let mut run = 0;

        for line in text.split('\n') {
            let content = line_content(line);
            if content.is_empty() {
                kept.push(line);
                previous = None;
                run = 0;
                continue;
            }

            if previous == Some(content) {
                run += 1;
                if run == 2 {
                    log::debug!("Repetition run detected: {}", preview(content));
                }
            } else {
                run = 0;
            }

            if !seen.insert(content) {
                removed += 1;
                continue;
            }
            kept.push(line);
            previous = Some(content);
        }

        if removed == 0 {
            return DedupPass::unchanged(text);
        }
        DedupPass {
            text: kept.join("\n"),
            removed,
            warnings: Vec::new(),
        }
    }
}

fn line_content(line: &str) -> &str {
    let trimmed = line.trim();
    match trimmed.strip_prefix('-') {
        Some(rest) if rest.starts_with(char::is_whitespace) && !rest.trim().is_empty() => {
            rest.trim()
        }
        _ => trimmed,
    }
}

fn preview(content: &str) -> String {
    content.chars().take(60).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_repeats_are_removed_anywhere() {
        let text = "- PTT ปิด 35 บาท\n- KBANK ทรงตัว\n- PTT ปิด 35 บาท";
        let pass = ExactLineDedup.apply(text);
        assert_eq!(pass.text, "- PTT ปิด 35 บาท\n- KBANK ทรงตัว");
        assert_eq!(pass.removed, 1);
    }

    #[test]
    fn test_bullet_and_plain_line_share_content() {
        let pass = ExactLineDedup.apply("Gold rose.\n-   Gold rose.");
        assert_eq!(pass.text, "Gold rose.");
    }

    #[test]
    fn test_repetition_run_collapses_to_one() {
        let pass = ExactLineDedup.apply("ok\nok\nok\nok\nend");
        assert_eq!(pass.text, "ok\nend");
        assert_eq!(pass.removed, 3);
    }

    #[test]
    fn test_blank_lines_and_near_repeats_survive() {
        let text = "line one\n\nline one.\n\n";
        let pass = ExactLineDedup.apply(text);
        assert_eq!(pass.text, text);
        assert_eq!(pass.removed, 0);
    }

    #[test]
    fn test_lone_dash_is_content() {
        assert_eq!(line_content("  -  "), "-");
        assert_eq!(line_content("-x"), "-x");
        assert_eq!(line_content("- x "), "x");
    }
}
