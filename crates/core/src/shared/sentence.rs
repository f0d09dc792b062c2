/// Segments longer than this (in chars) get the whitespace fallbacks.
const LONG_SEGMENT_CHARS: usize = 200;

/// Target length (in chars) when word-wrapping an unpunctuated segment.
const WRAP_CHARS: usize = 120;

/// A sentence and its byte span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Split text into sentences, the comparison unit for overlap resolution and
/// deduplication.
///
/// Boundaries, in order of preference:
/// 1. Line breaks.
/// 2. Terminal punctuation (`.`, `!`, `?`) followed by whitespace.
/// 3. Clause heads: an uppercase ticker-like token following a token that
///    does not end in a Latin letter (`... 105 บาท KBANK ทรงตัว`). Thai ASR
///    output rarely carries punctuation, and tickers open new clauses.
/// 4. For segments over 200 chars: runs of 2+ whitespace, then word-wrap.
pub fn split_sentences(text: &str) -> Vec<Sentence<'_>> {
    let mut spans = Vec::new();
    for line in line_spans(text) {
        for clause in punctuation_spans(text, line) {
            for head in clause_head_spans(text, clause) {
                spans.extend(long_segment_spans(text, head));
            }
        }
    }

    spans
        .into_iter()
        .filter_map(|span| trimmed(text, span))
        .map(|(start, end)| Sentence {
            text: &text[start..end],
            start,
            end,
        })
        .collect()
}

/// Number of whitespace-delimited words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn line_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == '\n' {
            spans.push((start, i));
            start = i + 1;
        }
    }
    spans.push((start, text.len()));
    spans
}

fn punctuation_spans(text: &str, (s, e): (usize, usize)) -> Vec<(usize, usize)> {
    let slice = &text[s..e];
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = slice.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if let Some(&(_, next)) = chars.peek() {
            if next.is_whitespace() {
                let cut = i + c.len_utf8();
                spans.push((s + start, s + cut));
                start = cut;
            }
        }
    }
    spans.push((s + start, e));
    spans
}

fn clause_head_spans(text: &str, (s, e): (usize, usize)) -> Vec<(usize, usize)> {
    let slice = &text[s..e];
    let tokens = token_offsets(slice);
    let mut spans = Vec::new();
    let mut start = 0;
    for pair in tokens.windows(2) {
        let (_, prev) = pair[0];
        let (offset, token) = pair[1];
        let prev_ends_latin = prev
            .chars()
            .last()
            .map_or(true, |c| c.is_ascii_alphabetic());
        if is_ticker_like(token) && !prev_ends_latin {
            spans.push((s + start, s + offset));
            start = offset;
        }
    }
    spans.push((s + start, e));
    spans
}

fn long_segment_spans(text: &str, span: (usize, usize)) -> Vec<(usize, usize)> {
    if char_len(text, span) <= LONG_SEGMENT_CHARS {
        return vec![span];
    }
    multi_space_spans(text, span)
        .into_iter()
        .flat_map(|part| {
            if char_len(text, part) > LONG_SEGMENT_CHARS {
                wrap_spans(text, part)
            } else {
                vec![part]
            }
        })
        .collect()
}

fn multi_space_spans(text: &str, (s, e): (usize, usize)) -> Vec<(usize, usize)> {
    let slice = &text[s..e];
    let mut spans = Vec::new();
    let mut start = 0;
    let mut run_start: Option<usize> = None;
    let mut run_len = 0;
    for (i, c) in slice.char_indices() {
        if c.is_whitespace() {
            if run_start.is_none() {
                run_start = Some(i);
            }
            run_len += 1;
            continue;
        }
        if let Some(run) = run_start.take() {
            if run_len >= 2 {
                spans.push((s + start, s + run));
                start = i;
            }
        }
        run_len = 0;
    }
    spans.push((s + start, e));
    spans
}

fn wrap_spans(text: &str, (s, e): (usize, usize)) -> Vec<(usize, usize)> {
    let slice = &text[s..e];
    let mut spans = Vec::new();
    let mut current_start: Option<usize> = None;
    let mut current_len = 0;
    for (offset, token) in token_offsets(slice) {
        if current_start.is_none() {
            current_start = Some(offset);
        }
        current_len += token.chars().count() + 1;
        if current_len > WRAP_CHARS {
            if let Some(start) = current_start.take() {
                spans.push((s + start, s + offset + token.len()));
            }
            current_len = 0;
        }
    }
    if let Some(start) = current_start {
        spans.push((s + start, e));
    }
    spans
}

fn token_offsets(slice: &str) -> Vec<(usize, &str)> {
    let base = slice.as_ptr() as usize;
    slice
        .split_whitespace()
        .map(|token| (token.as_ptr() as usize - base, token))
        .collect()
}

fn is_ticker_like(token: &str) -> bool {
    let letters = token.chars().filter(|c| c.is_ascii_uppercase()).count();
    token.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && letters >= 2
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '&' || c == '-')
}

fn char_len(text: &str, (s, e): (usize, usize)) -> usize {
    text[s..e].chars().count()
}

fn trimmed(text: &str, (s, e): (usize, usize)) -> Option<(usize, usize)> {
    let slice = &text[s..e];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lead = slice.len() - slice.trim_start().len();
    Some((s + lead, s + lead + trimmed.len()))
}
