//! Record Set Extractor: raw list text → normalized set of records.
//!
//! Normalization:
//! 1. Strip a leading UTF-8 BOM.
//! 2. Split into lines (`\n` or `\r\n`).
//! 3. Trim surrounding whitespace; drop empty lines.
//! 4. Drop lines starting with a comment prefix (`#` by default).
//!
//! Casing is preserved. Extraction is total: nothing in the input can make
//! it fail.

use std::collections::HashSet;

/// Normalized records from one file at one revision. No duplicates, no order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet(HashSet<String>);

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, record: &str) -> bool {
        self.0.contains(record)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RecordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Parses list content with a configurable set of comment prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extractor {
    comment_prefixes: Vec<String>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            comment_prefixes: vec!["#".to_string()],
        }
    }
}

impl Extractor {
    pub fn new(comment_prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            comment_prefixes: comment_prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// Extract records from `text`.
    pub fn extract(&self, text: &str) -> RecordSet {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !self.is_comment(line))
            .collect()
    }

    /// Extract records from content that may not exist at a revision.
    ///
    /// A missing file is an empty set, so a newly added file reports every
    /// record as new without any special casing downstream.
    pub fn extract_optional(&self, text: Option<&str>) -> RecordSet {
        text.map(|t| self.extract(t)).unwrap_or_default()
    }

    fn is_comment(&self, line: &str) -> bool {
        self.comment_prefixes.iter().any(|p| line.starts_with(p.as_str()))
    }
}

/// Extract with the default `#` comment convention.
pub fn extract(text: &str) -> RecordSet {
    Extractor::default().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_blank_lines_are_dropped() {
        let set = extract("# comment\n\nfoo.com\n  bar.net  \n");
        assert_eq!(set, RecordSet::from_iter(["foo.com", "bar.net"]));
    }

    #[test]
    fn indented_comment_is_still_a_comment() {
        let set = extract("   # indented\nfoo.com\n");
        assert_eq!(set, RecordSet::from_iter(["foo.com"]));
    }

    #[test]
    fn duplicates_collapse() {
        let set = extract("a.com\na.com\n  a.com\n");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn casing_is_preserved() {
        let set = extract("Example.COM\nexample.com\n");
        assert_eq!(set.len(), 2);
        assert!(set.contains("Example.COM"));
    }

    #[test]
    fn crlf_and_bom_are_handled() {
        let set = extract("\u{feff}a.com\r\nb.com\r\n# c\r\n");
        assert_eq!(set, RecordSet::from_iter(["a.com", "b.com"]));
    }

    #[test]
    fn missing_content_is_empty() {
        assert!(Extractor::default().extract_optional(None).is_empty());
        assert!(extract("").is_empty());
        assert!(extract("\n\n   \n# only comments\n").is_empty());
    }

    #[test]
    fn custom_prefixes_replace_the_default() {
        let adblock = Extractor::new(["!", "["]);
        let set = adblock.extract("[Adblock Plus]\n! Title: x\n||a.com^\n#not-a-comment-here\n");
        assert_eq!(set, RecordSet::from_iter(["||a.com^", "#not-a-comment-here"]));
    }

    #[test]
    fn empty_prefixes_are_ignored_rather_than_matching_everything() {
        let extractor = Extractor::new(["", "#"]);
        assert_eq!(extractor.extract("a.com\n#x\n"), RecordSet::from_iter(["a.com"]));
    }

    #[test]
    fn hosts_style_lines_are_kept_verbatim() {
        let set = extract("0.0.0.0 ads.example.com\n");
        assert!(set.contains("0.0.0.0 ads.example.com"));
    }
}
