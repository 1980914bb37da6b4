//! GitHub permalink parsing.
//!
//! A permalink references a file at a fixed commit, optionally narrowed to a
//! line or a line span:
//!
//! ```text
//! https://github.com/<owner>/<repository>/blob/<commit>/<path>[#L<line>[-L<line_end>]]
//! ```

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::{Captures, Regex};

use crate::error::{EmbedError, Result};

static PERMALINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https://github\.com/(?<owner>[^/]+)/(?<repository>[^/]+)/blob/(?<commit>[^/]+)/(?<path>[^#]+)(?:#L(?<line>\d+)(?:-L(?<line_end>\d+))?)?",
    )
    .expect("permalink pattern is valid")
});

/// Lines selected by a permalink fragment. Line numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineRange {
    /// No fragment: the whole file.
    Whole,
    /// `#L<n>`.
    Single(usize),
    /// `#L<n>-L<m>`. Neither ordering nor positivity is checked.
    Span(usize, usize),
}

impl LineRange {
    /// Build a range from optional start and end lines.
    ///
    /// Returns `None` for an end line without a start line.
    pub fn from_parts(line: Option<usize>, line_end: Option<usize>) -> Option<Self> {
        match (line, line_end) {
            (None, None) => Some(Self::Whole),
            (Some(line), None) => Some(Self::Single(line)),
            (Some(line), Some(end)) => Some(Self::Span(line, end)),
            (None, Some(_)) => None,
        }
    }

    /// Start line, if a fragment was given.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Whole => None,
            Self::Single(line) | Self::Span(line, _) => Some(*line),
        }
    }

    /// End line, if a span was given.
    pub fn line_end(&self) -> Option<usize> {
        match self {
            Self::Span(_, end) => Some(*end),
            Self::Whole | Self::Single(_) => None,
        }
    }

    /// Inclusive 1-based bounds for a file of `total` lines.
    ///
    /// A zero start line counts as absent (the whole file), as does a zero
    /// end line (the start line only).
    pub fn bounds(&self, total: usize) -> (usize, usize) {
        match *self {
            Self::Whole | Self::Single(0) | Self::Span(0, _) => (1, total),
            Self::Single(line) | Self::Span(line, 0) => (line, line),
            Self::Span(line, end) => (line, end),
        }
    }

    /// Select the referenced lines, clamping out-of-range bounds.
    ///
    /// An inverted or out-of-range span selects nothing.
    pub fn select<'a, T>(&self, lines: &'a [T]) -> &'a [T] {
        let (line, end) = self.bounds(lines.len());
        let start = line.saturating_sub(1).min(lines.len());
        let end = end.min(lines.len());
        if start >= end {
            return &[];
        }
        &lines[start..end]
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whole => Ok(()),
            Self::Single(line) => write!(f, "#L{line}"),
            Self::Span(line, end) => write!(f, "#L{line}-L{end}"),
        }
    }
}

/// A parsed GitHub permalink.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permalink {
    owner: String,
    repository: String,
    commit: String,
    path: String,
    range: LineRange,
}

impl Permalink {
    /// Create a permalink from its parts.
    pub fn new(
        owner: impl Into<String>,
        repository: impl Into<String>,
        commit: impl Into<String>,
        path: impl Into<String>,
        range: LineRange,
    ) -> Self {
        Self {
            owner: owner.into(),
            repository: repository.into(),
            commit: commit.into(),
            path: path.into(),
            range,
        }
    }

    /// Repository owner or organization.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Commit SHA or ref.
    pub fn commit(&self) -> &str {
        &self.commit
    }

    /// File path within the repository.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Selected line range.
    pub fn range(&self) -> LineRange {
        self.range
    }

    /// Start line, if any.
    pub fn line(&self) -> Option<usize> {
        self.range.line()
    }

    /// End line, if any.
    pub fn line_end(&self) -> Option<usize> {
        self.range.line_end()
    }

    fn from_captures(url: &str, caps: &Captures<'_>) -> Result<Self> {
        let group = |name: &str| caps.name(name).map(|m| m.as_str());
        let number = |name: &str| -> Result<Option<usize>> {
            group(name)
                .map(|digits| {
                    digits
                        .parse::<usize>()
                        .map_err(|_| EmbedError::invalid_permalink(url))
                })
                .transpose()
        };

        let (Some(owner), Some(repository), Some(commit), Some(path)) = (
            group("owner"),
            group("repository"),
            group("commit"),
            group("path"),
        ) else {
            return Err(EmbedError::invalid_permalink(url));
        };

        let range = LineRange::from_parts(number("line")?, number("line_end")?)
            .ok_or_else(|| EmbedError::invalid_permalink(url))?;

        Ok(Self::new(owner, repository, commit, path, range))
    }
}

impl fmt::Display for Permalink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "https://github.com/{}/{}/blob/{}/{}{}",
            self.owner, self.repository, self.commit, self.path, self.range
        )
    }
}

impl FromStr for Permalink {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Self> {
        parse_permalink(s)
    }
}

/// Parse the first permalink found in `url`.
pub fn parse_permalink(url: &str) -> Result<Permalink> {
    let caps = PERMALINK_REGEX
        .captures(url)
        .ok_or_else(|| EmbedError::invalid_permalink(url))?;
    Permalink::from_captures(url, &caps)
}

/// Whether `url` contains a permalink.
pub fn is_permalink(url: &str) -> bool {
    PERMALINK_REGEX.is_match(url)
}

/// The permalink text matched inside `text`, if any.
pub fn find_permalink(text: &str) -> Option<&str> {
    PERMALINK_REGEX.find(text).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://github.com/yu7400ki/yu7400ki.me/blob/hash/path/to/file";

    #[test]
    fn test_matches_url_with_line() {
        assert!(is_permalink(&format!("{BASE}#L1")));
    }

    #[test]
    fn test_matches_url_with_span() {
        assert!(is_permalink(&format!("{BASE}#L1-L2")));
    }

    #[test]
    fn test_matches_url_without_line() {
        assert!(is_permalink(BASE));
    }

    #[test]
    fn test_rejects_other_urls() {
        assert!(!is_permalink("https://example.com"));
        assert!(!is_permalink("https://github.com/yu7400ki/yu7400ki.me"));
        assert!(!is_permalink("http://github.com/a/b/blob/c/d"));
    }

    #[test]
    fn test_parse_with_line() {
        let permalink = parse_permalink(&format!("{BASE}#L1")).unwrap();

        assert_eq!(
            permalink,
            Permalink::new(
                "yu7400ki",
                "yu7400ki.me",
                "hash",
                "path/to/file",
                LineRange::Single(1)
            )
        );
        assert_eq!(permalink.line(), Some(1));
        assert_eq!(permalink.line_end(), None);
    }

    #[test]
    fn test_parse_with_span() {
        let permalink = parse_permalink(&format!("{BASE}#L1-L2")).unwrap();

        assert_eq!(permalink.owner(), "yu7400ki");
        assert_eq!(permalink.repository(), "yu7400ki.me");
        assert_eq!(permalink.commit(), "hash");
        assert_eq!(permalink.path(), "path/to/file");
        assert_eq!(permalink.line(), Some(1));
        assert_eq!(permalink.line_end(), Some(2));
    }

    #[test]
    fn test_parse_without_line() {
        let permalink = parse_permalink(BASE).unwrap();

        assert_eq!(permalink.range(), LineRange::Whole);
        assert_eq!(permalink.line(), None);
        assert_eq!(permalink.line_end(), None);
    }

    #[test]
    fn test_parse_invalid_url() {
        let err = parse_permalink("https://example.com").unwrap_err();

        assert!(matches!(err, EmbedError::InvalidPermalink { .. }));
        assert!(err.to_string().contains("invalid permalink"));
    }

    #[test]
    fn test_parse_overflowing_line() {
        let err = parse_permalink(&format!("{BASE}#L99999999999999999999999")).unwrap_err();
        assert!(matches!(err, EmbedError::InvalidPermalink { .. }));
    }

    #[test]
    fn test_parse_does_not_validate_order() {
        let permalink = parse_permalink(&format!("{BASE}#L9-L5")).unwrap();
        assert_eq!(permalink.range(), LineRange::Span(9, 5));
    }

    #[test]
    fn test_parse_unanchored() {
        let text = format!("see {BASE}#L3 for details");
        let permalink = parse_permalink(&text).unwrap();

        // The path is a maximal run without `#`, so it stops at the fragment.
        assert_eq!(permalink.path(), "path/to/file");
        assert_eq!(permalink.line(), Some(3));
        assert_eq!(find_permalink(&text), Some(format!("{BASE}#L3").as_str()));
    }

    #[test]
    fn test_unknown_fragment_is_part_of_match_only_up_to_hash() {
        let permalink = parse_permalink(&format!("{BASE}#readme")).unwrap();

        assert_eq!(permalink.range(), LineRange::Whole);
        assert_eq!(find_permalink(&format!("{BASE}#readme")), Some(BASE));
    }

    #[test]
    fn test_round_trip() {
        for suffix in ["", "#L5", "#L5-L9"] {
            let url = format!("{BASE}{suffix}");
            let permalink: Permalink = url.parse().unwrap();
            assert_eq!(permalink.to_string(), url);
        }
    }

    #[test]
    fn test_line_range_from_parts() {
        assert_eq!(LineRange::from_parts(None, None), Some(LineRange::Whole));
        assert_eq!(LineRange::from_parts(Some(4), None), Some(LineRange::Single(4)));
        assert_eq!(LineRange::from_parts(Some(4), Some(6)), Some(LineRange::Span(4, 6)));
        assert_eq!(LineRange::from_parts(None, Some(6)), None);
    }

    #[test]
    fn test_select_lines() {
        let lines = ["a", "b", "c", "d", "e"];

        assert_eq!(LineRange::Whole.select(&lines), &lines);
        assert_eq!(LineRange::Single(2).select(&lines), &["b"]);
        assert_eq!(LineRange::Span(2, 4).select(&lines), &["b", "c", "d"]);
    }

    #[test]
    fn test_select_clamps() {
        let lines = ["a", "b", "c"];

        assert_eq!(LineRange::Span(2, 10).select(&lines), &["b", "c"]);
        assert_eq!(LineRange::Span(1, 0).select(&lines), &["a"]);
        assert!(LineRange::Single(10).select(&lines).is_empty());
        assert!(LineRange::Span(3, 1).select(&lines).is_empty());
        // Zero bounds fall back to the defaults.
        assert_eq!(LineRange::Single(0).select(&lines), &lines);
        assert_eq!(LineRange::Span(0, 2).select(&lines), &lines);
        assert_eq!(LineRange::Span(3, 0).select(&lines), &["c"]);
        assert!(LineRange::Whole.select::<&str>(&[]).is_empty());
    }
}
