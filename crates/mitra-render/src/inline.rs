use once_cell::sync::Lazy;
use regex::Regex;

use crate::InlineSpan;

static BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"));

/// Splits text on `**…**` pairs.
///
/// Segments alternate plain / emphasized starting with plain, so the result
/// always has odd length; empty segments are kept. An unmatched `**` stays
/// inside the trailing plain segment.
pub fn split_emphasis(text: &str) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in BOLD.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        spans.push(InlineSpan::Plain(text[last..whole.start()].to_string()));
        spans.push(InlineSpan::Emphasized(inner.as_str().to_string()));
        last = whole.end();
    }

    spans.push(InlineSpan::Plain(text[last..].to_string()));
    spans
}
