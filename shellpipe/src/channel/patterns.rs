//! Terminator matching for the read loop.
//!
//! The literal scan is a naive restart search: on a mismatch the pattern
//! cursor goes back to the start and scanning resumes one byte after where
//! the failed candidate began. Shell output between two prompts is small, so
//! the quadratic worst case never matters in practice.

use std::ops::Range;

use regex::bytes::Regex;

/// Find the end offset of the first occurrence of `terminator` in `buffer`.
///
/// An empty terminator matches any non-empty buffer in full, and never
/// matches an empty one.
pub fn find_terminator(buffer: &[u8], terminator: &[u8]) -> Option<usize> {
    if terminator.is_empty() {
        return (!buffer.is_empty()).then_some(buffer.len());
    }

    let mut candidate = 0;
    let mut cursor = 0;
    let mut matched = 0;
    while cursor < buffer.len() {
        if buffer[cursor] == terminator[matched] {
            matched += 1;
            cursor += 1;
            if matched == terminator.len() {
                return Some(cursor);
            }
        } else {
            candidate += 1;
            cursor = candidate;
            matched = 0;
        }
    }
    None
}

/// Length of the longest suffix of `buffer` that is a proper prefix of
/// `terminator`, i.e. bytes that may still turn into a match once more
/// output arrives.
pub fn partial_suffix_len(buffer: &[u8], terminator: &[u8]) -> usize {
    let longest = terminator.len().saturating_sub(1).min(buffer.len());
    (1..=longest)
        .rev()
        .find(|&n| buffer.ends_with(&terminator[..n]))
        .unwrap_or(0)
}

/// Trait for terminator matching - literal by default, regex for prompts
/// that vary.
pub trait PromptMatcher {
    /// Byte range of the first match in `data`, or None if no match.
    fn find_match(&self, data: &[u8]) -> Option<Range<usize>>;

    /// Number of trailing bytes of `data` that could be the start of a
    /// match and must be held back from streamed output.
    fn pending_len(&self, _data: &[u8]) -> usize {
        0
    }

    /// Check if the data matches the pattern.
    fn is_match(&self, data: &[u8]) -> bool {
        self.find_match(data).is_some()
    }
}

/// A literal terminator such as a sentinel prompt or `"\n"`.
#[derive(Debug, Clone, Copy)]
pub struct Terminator<'a>(pub &'a [u8]);

impl<'a> Terminator<'a> {
    pub fn new(terminator: &'a str) -> Self {
        Self(terminator.as_bytes())
    }
}

impl PromptMatcher for Terminator<'_> {
    fn find_match(&self, data: &[u8]) -> Option<Range<usize>> {
        find_terminator(data, self.0).map(|end| (end - self.0.len())..end)
    }

    fn pending_len(&self, data: &[u8]) -> usize {
        partial_suffix_len(data, self.0)
    }
}

/// Regex-based matcher.
impl PromptMatcher for Regex {
    fn find_match(&self, data: &[u8]) -> Option<Range<usize>> {
        self.find(data).map(|m| m.range())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_terminator_basic() {
        assert_eq!(find_terminator(b"abc>def", b">"), Some(4));
        assert_eq!(find_terminator(b"output\r\nPROMPT", b"PROMPT"), Some(14));
        assert_eq!(find_terminator(b"output", b"PROMPT"), None);
    }

    #[test]
    fn test_find_terminator_first_occurrence() {
        assert_eq!(find_terminator(b"a>b>c", b">"), Some(2));
    }

    #[test]
    fn test_find_terminator_restarts_after_partial() {
        // "AAB" has a failed candidate at 0 and a real match at 1.
        assert_eq!(find_terminator(b"AAB", b"AB"), Some(3));
        assert_eq!(find_terminator(b"PROMPROMPT", b"PROMPT"), Some(10));
    }

    #[test]
    fn test_find_terminator_empty() {
        assert_eq!(find_terminator(b"", b""), None);
        assert_eq!(find_terminator(b"anything", b""), Some(8));
        assert_eq!(find_terminator(b"", b"x"), None);
    }

    #[test]
    fn test_find_terminator_pattern_longer_than_buffer() {
        assert_eq!(find_terminator(b"PRO", b"PROMPT"), None);
    }

    #[test]
    fn test_partial_suffix_len() {
        assert_eq!(partial_suffix_len(b"listing\r\nPRO", b"PROMPT"), 3);
        assert_eq!(partial_suffix_len(b"listing\r\n", b"PROMPT"), 0);
        assert_eq!(partial_suffix_len(b"P", b"PROMPT"), 1);
        // A complete match is not a partial one.
        assert_eq!(partial_suffix_len(b"PROMPT", b"PROMPT"), 0);
        assert_eq!(partial_suffix_len(b"abc", b""), 0);
    }

    #[test]
    fn test_terminator_matcher_range() {
        let terminator = Terminator::new("$>");
        assert_eq!(terminator.find_match(b"out$>rest"), Some(3..5));
        assert!(!terminator.is_match(b"out$"));
        assert_eq!(terminator.pending_len(b"out$"), 1);
    }

    #[test]
    fn test_regex_prompt_matcher() {
        let pattern = Regex::new(r"[$#] $").unwrap();
        assert_eq!(pattern.find_match(b"output\nuser@host:~$ "), Some(18..20));
        assert!(!pattern.is_match(b"router> "));
        assert_eq!(pattern.pending_len(b"anything"), 0);
    }
}
