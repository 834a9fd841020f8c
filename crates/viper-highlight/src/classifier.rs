//! Rule tables and the claimed-span scanner.
//!
//! Rules run in table order. Every span a rule produces is *claimed*; later rules never
//! color inside a claimed span. This is what gives comments precedence over strings and
//! strings precedence over keywords and numbers.

use std::collections::BTreeMap;

use regex::{Captures, Regex};
use tracing::warn;
use viper_lang::{KeywordSet, LanguageFamily, PlainFlags};

use crate::ColorCategory;
use crate::patterns;

/// Extra acceptance check run on the start of every match of a rule.
pub type Guard = fn(text: &str, match_start: usize) -> bool;

/// A `//` directly after `:` is part of a URL, not a line comment.
pub fn not_after_colon(text: &str, match_start: usize) -> bool {
    !(text[match_start..].starts_with("//") && text[..match_start].ends_with(':'))
}

/// A single classification rule.
#[derive(Debug, Clone)]
pub struct Rule {
    regex: Regex,
    category: ColorCategory,
    capture_groups: Vec<usize>,
    guard: Option<Guard>,
}

impl Rule {
    /// Compile a rule that colors the whole match.
    pub fn new(pattern: &str, category: ColorCategory) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            category,
            capture_groups: Vec::new(),
            guard: None,
        })
    }

    /// Compile a rule, degrading to a literal match of `pattern` if it is not a valid regex.
    pub fn lenient(pattern: &str, category: ColorCategory) -> Option<Self> {
        match Self::new(pattern, category) {
            Ok(rule) => Some(rule),
            Err(err) => {
                warn!(%err, ?category, "highlight rule failed to compile, matching literally");
                Self::new(&regex::escape(pattern), category).ok()
            }
        }
    }

    /// Color only the given capture groups of each match instead of the whole match.
    pub fn with_capture_groups(mut self, groups: &[usize]) -> Self {
        self.capture_groups = groups.to_vec();
        self
    }

    /// Reject matches for which `guard` returns `false`.
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Category assigned to matches.
    pub fn category(&self) -> ColorCategory {
        self.category
    }

    /// Source pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// A classified token, in **byte** offsets of the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
    /// Category of the rule that matched.
    pub category: ColorCategory,
}

/// An ordered rule set for one language family.
#[derive(Debug, Clone, Default)]
pub struct TokenClassifier {
    rules: Vec<Rule>,
}

impl TokenClassifier {
    /// Classifier over `rules`; earlier rules win overlaps.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Rules in precedence order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Build the rule table for a language family.
    pub fn for_family(family: LanguageFamily) -> Self {
        use ColorCategory as C;

        let mut table: Vec<Option<Rule>> = Vec::new();
        let comments = |pattern: &str| {
            Rule::lenient(pattern, C::Comment).map(|rule| rule.with_guard(not_after_colon))
        };

        match family {
            LanguageFamily::Markup => {
                table.push(Rule::lenient(patterns::XML_COMMENTS, C::Comment));
                table.push(Rule::lenient(patterns::GENERAL_STRINGS, C::String));
                table.push(
                    Rule::lenient(patterns::HTML_TAGS, C::Tag)
                        .map(|r| r.with_capture_groups(&[1, 2])),
                );
                table.push(
                    Rule::lenient(patterns::HTML_ATTRS, C::Attribute)
                        .map(|r| r.with_capture_groups(&[1])),
                );
            }
            LanguageFamily::Css => {
                table.push(Rule::lenient(patterns::BLOCK_COMMENTS, C::Comment));
                table.push(Rule::lenient(patterns::GENERAL_STRINGS, C::String));
                table.push(
                    Rule::lenient(patterns::CSS_ATTRS, C::Attribute)
                        .map(|r| r.with_capture_groups(&[1])),
                );
                table.push(
                    Rule::lenient(patterns::CSS_ATTR_VALUE, C::AttributeValue)
                        .map(|r| r.with_capture_groups(&[1])),
                );
                table.push(Rule::lenient(patterns::SYMBOLS, C::Number));
            }
            LanguageFamily::Code {
                keywords,
                variables,
            } => {
                table.push(comments(patterns::GENERAL_COMMENTS));
                table.push(Rule::lenient(patterns::GENERAL_STRINGS, C::String));
                if variables {
                    table.push(Rule::lenient(patterns::PHP_VARIABLES, C::Variable));
                }
                let keywords = match keywords {
                    KeywordSet::General => patterns::GENERAL_KEYWORDS,
                    KeywordSet::Python => patterns::PY_KEYWORDS,
                    KeywordSet::Lua => patterns::LUA_KEYWORDS,
                };
                table.push(Rule::lenient(keywords, C::Keyword));
                table.push(Rule::lenient(patterns::NUMBERS, C::Number));
                table.push(Rule::lenient(patterns::SYMBOLS, C::Number));
            }
            LanguageFamily::Sql => {
                table.push(Rule::lenient(patterns::SQL_COMMENTS, C::Comment));
                table.push(Rule::lenient(patterns::GENERAL_STRINGS, C::String));
                table.push(Rule::lenient(patterns::SQL_KEYWORDS, C::Keyword));
                table.push(Rule::lenient(patterns::NUMBERS, C::Number));
                table.push(Rule::lenient(patterns::SYMBOLS, C::Number));
            }
            LanguageFamily::Plain(PlainFlags {
                markdown,
                hash_comments_only,
            }) => {
                if hash_comments_only {
                    table.push(Rule::lenient(patterns::HASH_COMMENTS, C::Comment));
                } else {
                    table.push(comments(patterns::GENERAL_COMMENTS));
                }
                if markdown {
                    // Links before strings so quotes inside a URL do not split it.
                    table.push(Rule::lenient(patterns::LINKS, C::Attribute));
                }
                table.push(Rule::lenient(patterns::GENERAL_STRINGS, C::String));
                if !markdown {
                    table.push(Rule::lenient(patterns::GENERAL_KEYWORDS, C::Keyword));
                }
                table.push(Rule::lenient(patterns::NUMBERS, C::Number));
                table.push(Rule::lenient(patterns::SYMBOLS, C::Number));
            }
        }

        Self::new(table.into_iter().flatten().collect())
    }

    /// Scan `text` and return non-overlapping tokens sorted by start (byte offsets).
    pub fn classify(&self, text: &str) -> Vec<Token> {
        let mut claimed = Claimed::default();
        let mut tokens = Vec::new();

        for rule in &self.rules {
            let mut at = 0;
            while at <= text.len() {
                let Some(caps) = rule.regex.captures_at(text, at) else {
                    break;
                };
                let Some(whole) = caps.get(0) else {
                    break;
                };

                if whole.is_empty() {
                    at = next_char(text, whole.end());
                    continue;
                }
                if let Some(guard) = rule.guard
                    && !guard(text, whole.start())
                {
                    at = next_char(text, whole.start());
                    continue;
                }

                if rule.capture_groups.is_empty() {
                    if claimed.overlaps(whole.start(), whole.end()) {
                        // Retry from inside the match: a shorter match may fit before or
                        // after the claimed span.
                        at = match claimed.containing(whole.start()) {
                            Some(end) => end.max(next_char(text, whole.start())),
                            None => next_char(text, whole.start()),
                        };
                        continue;
                    }
                    claimed.insert(whole.start(), whole.end());
                    tokens.push(Token {
                        start: whole.start(),
                        end: whole.end(),
                        category: rule.category,
                    });
                } else {
                    push_groups(&caps, rule, &mut claimed, &mut tokens);
                }
                at = whole.end();
            }
        }

        tokens.sort_by_key(|t| t.start);
        tokens
    }
}

fn push_groups(caps: &Captures<'_>, rule: &Rule, claimed: &mut Claimed, tokens: &mut Vec<Token>) {
    for &group in &rule.capture_groups {
        let Some(m) = caps.get(group) else {
            continue;
        };
        if m.is_empty() || claimed.overlaps(m.start(), m.end()) {
            continue;
        }
        claimed.insert(m.start(), m.end());
        tokens.push(Token {
            start: m.start(),
            end: m.end(),
            category: rule.category,
        });
    }
}

fn next_char(text: &str, byte: usize) -> usize {
    match text[byte..].chars().next() {
        Some(ch) => byte + ch.len_utf8(),
        None => byte + 1,
    }
}

/// Disjoint claimed byte ranges, keyed by start.
#[derive(Debug, Default)]
struct Claimed {
    spans: BTreeMap<usize, usize>,
}

impl Claimed {
    fn insert(&mut self, start: usize, end: usize) {
        self.spans.insert(start, end);
    }

    /// End of the claimed span containing `pos`, if any.
    fn containing(&self, pos: usize) -> Option<usize> {
        self.spans
            .range(..=pos)
            .next_back()
            .and_then(|(_, &end)| (end > pos).then_some(end))
    }

    fn overlaps(&self, start: usize, end: usize) -> bool {
        self.spans
            .range(..end)
            .next_back()
            .is_some_and(|(_, &claimed_end)| claimed_end > start)
    }
}
