//! Find/replace over a UTF-8 `&str`.
//!
//! All public inputs/outputs are **character offsets** (not byte offsets).
//!
//! - regex search: non-overlapping matches, multi-line mode, optional case folding
//! - literal search: every occurrence, including overlapping ones (`"aa"` in `"aaa"` matches at
//!   0 and 1)
//!
//! An invalid regex never fails the search; it degrades to a literal search for the same query.

use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Options that control how search is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// If `true`, performs a case-sensitive search.
    pub case_sensitive: bool,
    /// If `true`, treats the query as a regex pattern.
    pub regex: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            regex: false,
        }
    }
}

/// A match returned by the search APIs, expressed as a half-open character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// Inclusive start character offset.
    pub start: usize,
    /// Exclusive end character offset.
    pub end: usize,
}

impl SearchMatch {
    /// Returns the length of the match in characters.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the match is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Debug)]
pub(crate) struct CharIndex {
    char_to_byte: Vec<usize>,
    text_len: usize,
}

impl CharIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut char_to_byte: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        char_to_byte.push(text.len());
        Self {
            char_to_byte,
            text_len: text.len(),
        }
    }

    pub(crate) fn byte_to_char(&self, byte_offset: usize) -> usize {
        let clamped = byte_offset.min(self.text_len);
        match self.char_to_byte.binary_search(&clamped) {
            Ok(idx) => idx,
            Err(idx) => idx,
        }
    }
}

fn compile_search_regex(query: &str, options: SearchOptions) -> Option<Regex> {
    match RegexBuilder::new(query)
        .case_insensitive(!options.case_sensitive)
        .multi_line(true)
        .build()
    {
        Ok(re) => Some(re),
        Err(err) => {
            warn!(%err, query, "invalid search regex, falling back to literal search");
            None
        }
    }
}

fn fold(ch: char, case_sensitive: bool) -> char {
    if case_sensitive {
        ch
    } else {
        // First char of the lowercase mapping keeps one char per char, so offsets survive.
        ch.to_lowercase().next().unwrap_or(ch)
    }
}

fn find_literal(text: &str, query: &str, case_sensitive: bool) -> Vec<SearchMatch> {
    let needle: Vec<char> = query.chars().map(|c| fold(c, case_sensitive)).collect();
    let haystack: Vec<char> = text.chars().map(|c| fold(c, case_sensitive)).collect();
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }

    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle.as_slice())
        .map(|(start, _)| SearchMatch {
            start,
            end: start + needle.len(),
        })
        .collect()
}

fn find_regex(text: &str, re: &Regex) -> Vec<SearchMatch> {
    let index = CharIndex::new(text);
    re.find_iter(text)
        .map(|m| SearchMatch {
            start: index.byte_to_char(m.start()),
            end: index.byte_to_char(m.end()),
        })
        .filter(|m| !m.is_empty())
        .collect()
}

/// Find all occurrences of `query` in `text`, in ascending order.
///
/// Returns an empty list for an empty query.
pub fn find_matches(text: &str, query: &str, options: SearchOptions) -> Vec<SearchMatch> {
    if query.is_empty() {
        return Vec::new();
    }
    if options.regex
        && let Some(re) = compile_search_regex(query, options)
    {
        return find_regex(text, &re);
    }
    find_literal(text, query, options.case_sensitive)
}

/// Start offsets of all occurrences of `query` in `text`.
pub fn search(text: &str, query: &str, options: SearchOptions) -> Vec<usize> {
    find_matches(text, query, options)
        .into_iter()
        .map(|m| m.start)
        .collect()
}

/// Replace every occurrence of `query`; returns the new text and the replacement count.
///
/// Regex replacements expand `$1`/`${name}` references. Literal replacements skip matches
/// that overlap an earlier replaced one.
pub fn replace_all(
    text: &str,
    query: &str,
    replacement: &str,
    options: SearchOptions,
) -> (String, usize) {
    if query.is_empty() {
        return (text.to_string(), 0);
    }
    if options.regex
        && let Some(re) = compile_search_regex(query, options)
    {
        let count = re.find_iter(text).filter(|m| !m.is_empty()).count();
        return (re.replace_all(text, replacement).into_owned(), count);
    }

    let mut out = String::with_capacity(text.len());
    let mut count = 0;
    let mut last = 0;
    let chars: Vec<char> = text.chars().collect();
    for m in find_literal(text, query, options.case_sensitive) {
        if m.start < last {
            continue;
        }
        out.extend(&chars[last..m.start]);
        out.push_str(replacement);
        last = m.end;
        count += 1;
    }
    out.extend(&chars[last..]);
    (out, count)
}

/// Navigation and replace bookkeeping for a completed search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Remaining matches, ascending.
    pub matches: Vec<SearchMatch>,
    /// Current match; `None` before the first one.
    pub index: Option<usize>,
    /// Searched text.
    pub query: String,
    /// Replacement text (empty for a plain find).
    pub replacement: String,
    /// The search was started as a find/replace.
    pub is_replace: bool,
    /// The query was a regex.
    pub is_regex: bool,
}

impl SearchResult {
    /// Wrap matches from [`find_matches`]; the first match is current.
    pub fn new(
        matches: Vec<SearchMatch>,
        query: impl Into<String>,
        replacement: Option<String>,
        is_regex: bool,
    ) -> Self {
        let index = (!matches.is_empty()).then_some(0);
        Self {
            matches,
            index,
            query: query.into(),
            is_replace: replacement.is_some(),
            replacement: replacement.unwrap_or_default(),
            is_regex,
        }
    }

    /// Number of matches.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns `true` if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// The current match.
    pub fn current(&self) -> Option<SearchMatch> {
        self.index.and_then(|i| self.matches.get(i).copied())
    }

    /// A later match exists.
    pub fn has_next(&self) -> bool {
        match self.index {
            Some(i) => i + 1 < self.matches.len(),
            None => !self.matches.is_empty(),
        }
    }

    /// An earlier match exists.
    pub fn has_previous(&self) -> bool {
        self.index.is_some_and(|i| i > 0)
    }

    /// Move to the next match.
    pub fn next_match(&mut self) -> Option<SearchMatch> {
        if !self.has_next() {
            return None;
        }
        self.index = Some(self.index.map_or(0, |i| i + 1));
        self.current()
    }

    /// Move to the previous match.
    pub fn previous_match(&mut self) -> Option<SearchMatch> {
        if !self.has_previous() {
            return None;
        }
        self.index = self.index.map(|i| i - 1);
        self.current()
    }

    /// Replacing is possible.
    pub fn can_replace_something(&self) -> bool {
        self.is_replace && !self.matches.is_empty()
    }

    /// Record that the current match was replaced with [`Self::replacement`].
    ///
    /// The match is removed together with any overlapping matches, later matches shift by the
    /// length difference and the index steps back, so [`Self::next_match`] lands on the first
    /// match after the replaced text.
    pub fn done_replace(&mut self) {
        let Some(i) = self.index else {
            return;
        };
        if i >= self.matches.len() {
            return;
        }
        let removed = self.matches.remove(i);
        let inserted = self.replacement.chars().count();

        let mut kept_before: usize = 0;
        let mut matches = Vec::with_capacity(self.matches.len());
        for (j, m) in std::mem::take(&mut self.matches).into_iter().enumerate() {
            if j < i {
                if m.end <= removed.start {
                    kept_before += 1;
                    matches.push(m);
                }
            } else if m.start >= removed.end {
                matches.push(SearchMatch {
                    start: m.start - removed.len() + inserted,
                    end: m.end - removed.len() + inserted,
                });
            }
        }
        self.matches = matches;
        self.index = kept_before.checked_sub(1);
    }
}
