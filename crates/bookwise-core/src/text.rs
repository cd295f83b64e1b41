//! Chapter text preparation before it is sent to a remote model.
//!
//! Raw chapter text comes straight out of the reader's book parser and can carry
//! layout whitespace and stray control characters. Providers bill by token and cap
//! input size, so the text is normalized and cut to a character budget, preferring
//! to end on a sentence boundary.

use regex::Regex;
use std::sync::OnceLock;

/// Appended when a truncated window contains no usable sentence terminator
pub const ELLIPSIS: &str = "...";

const SENTENCE_TERMINATORS: [char; 6] = ['。', '！', '？', '.', '!', '?'];

fn whitespace_run() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{1f}' | '\u{7f}')
}

/// Collapse whitespace runs, drop control characters and trim.
pub fn clean(raw: &str) -> String {
    let collapsed = whitespace_run().replace_all(raw, " ");
    let stripped: String = collapsed.chars().filter(|&c| !is_stripped_control(c)).collect();
    stripped.trim().to_string()
}

/// Clean `raw` and cut it to at most `limit` characters.
///
/// Over-long text is cut back to the last sentence terminator inside the first
/// `limit` characters. When there is none (or it is the very first character) the
/// `limit`-character prefix is returned with [`ELLIPSIS`] appended, so the result is
/// never longer than `limit + ELLIPSIS.len()` characters.
pub fn prepare(raw: &str, limit: usize) -> String {
    let cleaned = clean(raw);

    let cut = match cleaned.char_indices().nth(limit) {
        Some((idx, _)) => idx,
        None => return cleaned,
    };
    let window = &cleaned[..cut];

    let last_terminator = window
        .char_indices()
        .enumerate()
        .filter(|(_, (_, c))| SENTENCE_TERMINATORS.contains(c))
        .last();

    match last_terminator {
        Some((position, (idx, c))) if position > 0 => window[..idx + c.len_utf8()].to_string(),
        _ => format!("{window}{ELLIPSIS}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_collapses_whitespace() {
        assert_eq!(clean("  Chapter\n\n\tOne   begins  "), "Chapter One begins");
    }

    #[test]
    fn test_clean_strips_control_characters() {
        assert_eq!(clean("bell\u{7}ring\u{7f}s"), "bellrings");
        assert_eq!(clean("\u{1b}[0mplain"), "[0mplain");
    }

    #[test]
    fn test_short_text_is_returned_cleaned() {
        assert_eq!(prepare("  a short\nchapter. ", 100), "a short chapter.");
        assert_eq!(prepare("exactly10!", 10), "exactly10!");
    }

    #[test]
    fn test_truncates_at_last_terminator() {
        let prepared = prepare("他走了。她哭了！然后呢很长很长的一段", 10);
        assert_eq!(prepared, "他走了。她哭了！");
    }

    #[test]
    fn test_truncates_at_ascii_terminator() {
        let prepared = prepare("One. Two? Three and more words follow", 12);
        assert_eq!(prepared, "One. Two?");
    }

    #[test]
    fn test_no_terminator_appends_ellipsis() {
        let prepared = prepare("abcdefghijklmnop", 5);
        assert_eq!(prepared, "abcde...");
    }

    #[test]
    fn test_terminator_at_start_is_ignored() {
        let prepared = prepare(".abcdefgh", 4);
        assert_eq!(prepared, ".abc...");
    }

    #[test]
    fn test_terminator_outside_window_is_ignored() {
        let prepared = prepare("abcdefgh. tail", 5);
        assert_eq!(prepared, "abcde...");
    }

    #[test]
    fn test_zero_limit() {
        assert_eq!(prepare("anything", 0), "...");
        assert_eq!(prepare("   ", 0), "");
    }

    #[test]
    fn test_length_never_exceeds_limit_plus_ellipsis() {
        let samples = [
            "第一章 风起。少年站在山巅，望着远方！他会回来吗？也许不会",
            "no punctuation at all in this rather long line of text",
            "Mixed 中文 and English. With\tcontrol\u{1}chars!",
            "?!?!?!?!?!?!?!?!",
        ];

        for sample in samples {
            for limit in 0..40 {
                let prepared = prepare(sample, limit);
                let len = prepared.chars().count();
                assert!(len <= limit + ELLIPSIS.len(), "{sample:?} @ {limit}: {prepared:?}");

                let cleaned = clean(sample);
                if cleaned.chars().count() <= limit {
                    assert_eq!(prepared, cleaned);
                } else {
                    let window: String = cleaned.chars().take(limit).collect();
                    let has_terminator = window
                        .chars()
                        .skip(1)
                        .any(|c| SENTENCE_TERMINATORS.contains(&c));
                    if has_terminator {
                        let last = prepared.chars().last().unwrap();
                        assert!(SENTENCE_TERMINATORS.contains(&last));
                    } else {
                        assert!(prepared.ends_with(ELLIPSIS));
                    }
                }
            }
        }
    }
}
