//! Short-form / long-form content reconciliation.
//!
//! Feeds disagree on where the body of an item lives: some duplicate it in
//! both fields, some only fill the summary, podcast feeds hide it in iTunes
//! extensions. [`reconcile_fields`] folds all of that into one long-form text
//! plus an optional short-form text that is only kept when it says something
//! the long-form text does not.

use crate::app::Result;
use crate::convert::TextConverter;

/// Above this similarity the short-form text is considered redundant.
pub const SIMILARITY_THRESHOLD: f64 = 0.1;

/// Fallback texts some feeds only provide through extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Alternates<'a> {
    pub subtitle: Option<&'a str>,
    pub summary: Option<&'a str>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub summary: String,
    pub content: String,
}

impl Fields {
    pub fn new(summary: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            content: content.into(),
        }
    }

    pub fn summary(&self) -> Option<&str> {
        Some(self.summary.as_str()).filter(|s| !s.is_empty())
    }
}

/// Picks which raw text goes where, before any conversion.
pub fn select_fields(summary: &str, content: &str, alternates: Alternates<'_>) -> Fields {
    let mut fields = Fields::new(summary, content);

    if summary == content {
        fields.summary.clear();
    } else if content.is_empty() && !summary.is_empty() {
        fields.content = summary.to_string();
    }

    if fields.summary.is_empty() {
        if let Some(subtitle) = alternates.subtitle.filter(|s| !s.is_empty()) {
            fields.summary = subtitle.to_string();
        }
    }
    if fields.content.is_empty() {
        if let Some(summary) = alternates.summary.filter(|s| !s.is_empty()) {
            fields.content = summary.to_string();
        }
    }

    fields
}

/// Positional character similarity in `[0, 1]`: one minus the Hamming
/// distance over the longer length, counting the length difference as
/// mismatches. Two empty strings are identical.
pub fn hamming_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if longer.is_empty() {
        return 1.0;
    }

    let mismatches = shorter
        .iter()
        .zip(longer.iter())
        .filter(|(x, y)| x != y)
        .count();
    let distance = longer.len() - shorter.len() + mismatches;

    1.0 - distance as f64 / longer.len() as f64
}

/// Full heuristic: select, convert both fields, then drop the short-form
/// text when `similarity` judges it too close to the long-form text.
pub fn reconcile_fields<F>(
    summary: &str,
    content: &str,
    alternates: Alternates<'_>,
    converter: &dyn TextConverter,
    similarity: F,
) -> Result<Fields>
where
    F: Fn(&str, &str) -> f64,
{
    let selected = select_fields(summary, content, alternates);

    let mut fields = Fields {
        summary: converter.convert(&selected.summary)?,
        content: converter.convert(&selected.content)?,
    };

    if similarity(&fields.summary, &fields.content) > SIMILARITY_THRESHOLD {
        fields.summary.clear();
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::EstuaryError;

    struct Identity;

    impl TextConverter for Identity {
        fn convert(&self, markup: &str) -> Result<String> {
            Ok(markup.to_string())
        }
    }

    struct Failing;

    impl TextConverter for Failing {
        fn convert(&self, _markup: &str) -> Result<String> {
            Err(EstuaryError::Conversion("unbalanced tag".into()))
        }
    }

    fn run(summary: &str, content: &str) -> Fields {
        reconcile_fields(
            summary,
            content,
            Alternates::default(),
            &Identity,
            hamming_similarity,
        )
        .unwrap()
    }

    #[test]
    fn test_identical_fields_keep_only_content() {
        assert_eq!(run("same text", "same text"), Fields::new("", "same text"));
    }

    #[test]
    fn test_summary_promoted_when_content_empty() {
        // Promotion copies the text; the copy is then identical and dropped.
        assert_eq!(run("only summary", ""), Fields::new("", "only summary"));
    }

    #[test]
    fn test_alternates_fill_empty_fields() {
        let alternates = Alternates {
            subtitle: Some("a subtitle"),
            summary: Some("a much longer itunes summary of the episode"),
        };
        let fields =
            reconcile_fields("", "", alternates, &Identity, hamming_similarity).unwrap();
        assert_eq!(fields.content, "a much longer itunes summary of the episode");
        assert_eq!(fields.summary, "a subtitle");
    }

    #[test]
    fn test_alternates_ignored_when_fields_present() {
        let alternates = Alternates {
            subtitle: Some("sub"),
            summary: Some("alt"),
        };
        let selected = select_fields("teaser", "body text", alternates);
        assert_eq!(selected, Fields::new("teaser", "body text"));
    }

    #[test]
    fn test_prefix_summary_is_dropped() {
        let fields = run("Hello", "Hello world");
        assert_eq!(fields.summary, "");
        assert_eq!(fields.content, "Hello world");
    }

    #[test]
    fn test_distinct_summary_is_kept() {
        let fields = run("Short teaser", "Long body with entirely different wording");
        assert_eq!(fields.summary, "Short teaser");
    }

    #[test]
    fn test_short_prefix_of_long_body_registers_as_different() {
        let body = format!("Hi{}", " and then a very long body".repeat(4));
        let fields = run("Hi", &body);
        assert_eq!(fields.summary, "Hi");
    }

    #[test]
    fn test_reconciliation_is_idempotent() {
        let cases = [
            ("same", "same"),
            ("only summary", ""),
            ("Hello", "Hello world"),
            ("Short teaser", "Long body with entirely different wording"),
            ("", "just content"),
            ("", ""),
        ];
        for (summary, content) in cases {
            let once = run(summary, content);
            let twice = run(&once.summary, &once.content);
            assert_eq!(once, twice, "input ({summary:?}, {content:?})");
        }
    }

    #[test]
    fn test_conversion_failure_propagates() {
        let result = reconcile_fields(
            "a",
            "b",
            Alternates::default(),
            &Failing,
            hamming_similarity,
        );
        assert!(matches!(result, Err(EstuaryError::Conversion(_))));
    }

    #[test]
    fn test_hamming_similarity() {
        assert_eq!(hamming_similarity("", ""), 1.0);
        assert_eq!(hamming_similarity("abc", "abc"), 1.0);
        assert_eq!(hamming_similarity("", "abc"), 0.0);
        assert_eq!(hamming_similarity("abcd", "abxd"), 0.75);
        assert_eq!(hamming_similarity("ab", "abcd"), 0.5);
        assert_eq!(hamming_similarity("Abc", "abc"), 1.0 - 1.0 / 3.0);
    }

    #[test]
    fn test_hamming_counts_chars_not_bytes() {
        assert!((hamming_similarity("héllo", "hello") - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_custom_similarity_is_used() {
        let fields = reconcile_fields(
            "teaser",
            "body",
            Alternates::default(),
            &Identity,
            |_, _| 0.0,
        )
        .unwrap();
        assert_eq!(fields.summary(), Some("teaser"));
    }
}
