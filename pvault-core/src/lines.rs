//! Line-windowing transforms for long, log-like placeholder values.
//!
//! Lines are separated by `\n` or `\r\n`. Retained lines are sliced straight out of
//! the input, so whatever terminator they used is kept as is.

/// Window size used by the trim actions.
pub const DEFAULT_TRIM_LINES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTransform {
    Head,
    Tail,
    HeadAndTail,
}

impl LineTransform {
    pub fn apply(self, text: &str, n: usize) -> String {
        match self {
            LineTransform::Head => head(text, n),
            LineTransform::Tail => tail(text, n),
            LineTransform::HeadAndTail => head_and_tail(text, n),
        }
    }

    /// Suffix used in automation selectors for this action.
    pub fn selector_name(self) -> &'static str {
        match self {
            LineTransform::Head => "head",
            LineTransform::Tail => "tail",
            LineTransform::HeadAndTail => "head-tail",
        }
    }
}

/// Byte ranges of each line's content, terminators excluded.
fn line_spans(text: &str) -> Vec<(usize, usize)> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices('\n') {
        let end = if idx > start && text.as_bytes()[idx - 1] == b'\r' {
            idx - 1
        } else {
            idx
        };
        spans.push((start, end));
        start = idx + 1;
    }
    spans.push((start, text.len()));
    spans
}

pub fn split_lines(text: &str) -> Vec<&str> {
    line_spans(text)
        .into_iter()
        .map(|(start, end)| &text[start..end])
        .collect()
}

pub fn line_count(text: &str) -> usize {
    line_spans(text).len()
}

/// First `n` lines. Text with `n` lines or fewer comes back unchanged.
pub fn head(text: &str, n: usize) -> String {
    let spans = line_spans(text);
    if spans.len() <= n {
        return text.to_string();
    }
    match n.checked_sub(1).map(|last| spans[last]) {
        Some((_, end)) => text[..end].to_string(),
        None => String::new(),
    }
}

/// Last `n` lines. Text with `n` lines or fewer comes back unchanged.
pub fn tail(text: &str, n: usize) -> String {
    let spans = line_spans(text);
    if spans.len() <= n {
        return text.to_string();
    }
    if n == 0 {
        return String::new();
    }
    let (start, _) = spans[spans.len() - n];
    text[start..].to_string()
}

/// First and last `n` lines around a marker line counting what was dropped.
pub fn head_and_tail(text: &str, n: usize) -> String {
    let spans = line_spans(text);
    if spans.len() <= n.saturating_mul(2) {
        return text.to_string();
    }

    let omitted = spans.len() - 2 * n;
    let marker = format!("... ({omitted} lines omitted) ...");

    let mut result = String::new();
    if n > 0 {
        result.push_str(&text[..spans[n - 1].1]);
        result.push('\n');
    }
    result.push_str(&marker);
    if n > 0 {
        result.push('\n');
        result.push_str(&text[spans[spans.len() - n].0..]);
    }
    result
}
