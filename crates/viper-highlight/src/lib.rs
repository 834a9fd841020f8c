#![warn(missing_docs)]

//! `viper-highlight` - windowed regex-based syntax highlighting for `viper-core`.
//!
//! The crate is split in two layers:
//!
//! - [`TokenClassifier`]: an ordered rule table for one language family that scans a piece
//!   of text and yields typed tokens in byte offsets.
//! - [`HighlightDriver`]: picks the classifier for a file extension, runs it over a bounded
//!   window of the document and returns [`HighlightInfo`] spans in absolute **character**
//!   offsets.
//!
//! The driver is stateless across calls; windowing is owned by the caller.

mod classifier;
mod patterns;

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use tracing::trace;
use viper_lang::LanguageFamily;

pub use classifier::{Guard, Rule, Token, TokenClassifier, not_after_colon};

/// Color category of a highlighted span. The UI/theme layer maps these to actual colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorCategory {
    /// Language keywords.
    Keyword,
    /// String and character literals, quoted attribute values.
    String,
    /// Numbers, and operators/punctuation.
    Number,
    /// Line and block comments.
    Comment,
    /// Markup tag names and brackets.
    Tag,
    /// Markup and CSS attribute names, and links.
    Attribute,
    /// CSS property values.
    AttributeValue,
    /// `$name` variables.
    Variable,
    /// Uncolored text.
    Default,
}

/// A colored span with absolute document offsets (`end` exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightInfo {
    /// Start character offset.
    pub start: usize,
    /// Exclusive end character offset.
    pub end: usize,
    /// Color of the span.
    pub category: ColorCategory,
}

impl HighlightInfo {
    /// Span over `[start, end)`.
    pub fn new(start: usize, end: usize, category: ColorCategory) -> Self {
        Self {
            start,
            end,
            category,
        }
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// The span covers no characters.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Produces color spans for a window of a document.
///
/// Implementations must return spans sorted by start and non-overlapping, with
/// `window_offset` already added.
pub trait Highlighter {
    /// Spans for `window_text`, which starts at character offset `window_offset`.
    fn highlight(&self, window_text: &str, window_offset: usize) -> Vec<HighlightInfo>;
}

static CLASSIFIERS: LazyLock<Mutex<HashMap<LanguageFamily, Arc<TokenClassifier>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn classifier_for(family: LanguageFamily) -> Arc<TokenClassifier> {
    let mut cache = CLASSIFIERS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    cache
        .entry(family)
        .or_insert_with(|| Arc::new(TokenClassifier::for_family(family)))
        .clone()
}

/// Extension-dispatched highlighter.
#[derive(Debug, Clone)]
pub struct HighlightDriver {
    family: LanguageFamily,
    classifier: Arc<TokenClassifier>,
}

impl HighlightDriver {
    /// Driver for a file extension (`"java"`, `".html"`, ...). Unknown extensions get the
    /// plain-text rules.
    pub fn new(extension: &str) -> Self {
        Self::for_family(LanguageFamily::from_extension(extension))
    }

    /// Driver for a language family, sharing its cached classifier.
    pub fn for_family(family: LanguageFamily) -> Self {
        Self {
            family,
            classifier: classifier_for(family),
        }
    }

    /// Driver over a custom rule table.
    pub fn with_classifier(classifier: TokenClassifier) -> Self {
        Self {
            family: LanguageFamily::default(),
            classifier: Arc::new(classifier),
        }
    }

    /// Language family the rules were built for.
    pub fn family(&self) -> LanguageFamily {
        self.family
    }

    /// Highlight `window_text`, which starts at character offset `window_offset` of the
    /// document.
    pub fn highlight_text(&self, window_text: &str, window_offset: usize) -> Vec<HighlightInfo> {
        let tokens = self.classifier.classify(window_text);
        let spans = tokens_to_spans(window_text, &tokens, window_offset);
        trace!(
            family = ?self.family,
            window_offset,
            spans = spans.len(),
            "highlighted window"
        );
        spans
    }
}

impl Highlighter for HighlightDriver {
    fn highlight(&self, window_text: &str, window_offset: usize) -> Vec<HighlightInfo> {
        self.highlight_text(window_text, window_offset)
    }
}

/// One-shot form of [`HighlightDriver::highlight_text`].
pub fn highlight_text(window_text: &str, window_offset: usize, extension: &str) -> Vec<HighlightInfo> {
    HighlightDriver::new(extension).highlight_text(window_text, window_offset)
}

/// Convert sorted byte-offset tokens into character-offset spans in a single pass.
fn tokens_to_spans(text: &str, tokens: &[Token], window_offset: usize) -> Vec<HighlightInfo> {
    let mut byte_pos = 0;
    let mut char_pos = 0;
    let mut to_char = |byte: usize| {
        let byte = byte.min(text.len());
        if byte >= byte_pos {
            char_pos += text[byte_pos..byte].chars().count();
        } else {
            char_pos -= text[byte..byte_pos].chars().count();
        }
        byte_pos = byte;
        char_pos
    };

    tokens
        .iter()
        .filter(|t| t.start < t.end)
        .map(|t| {
            let start = to_char(t.start);
            let end = to_char(t.end);
            HighlightInfo::new(window_offset + start, window_offset + end, t.category)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_keyword() {
        let spans = highlight_text("public", 0, "java");
        assert_eq!(spans, vec![HighlightInfo::new(0, 6, ColorCategory::Keyword)]);
    }

    #[test]
    fn test_multiple_keywords() {
        let spans = highlight_text("public void", 0, "java");
        assert_eq!(
            spans,
            vec![
                HighlightInfo::new(0, 6, ColorCategory::Keyword),
                HighlightInfo::new(7, 11, ColorCategory::Keyword),
            ]
        );
    }

    #[test]
    fn test_window_offset_is_added() {
        let spans = highlight_text("int", 100, "c");
        assert_eq!(spans, vec![HighlightInfo::new(100, 103, ColorCategory::Keyword)]);
    }

    #[test]
    fn test_offsets_are_chars_not_bytes() {
        let spans = highlight_text("ππ int", 10, "java");
        assert_eq!(spans, vec![HighlightInfo::new(13, 16, ColorCategory::Keyword)]);
    }

    #[test]
    fn test_driver_caches_classifiers_per_family() {
        let a = HighlightDriver::new("java");
        let b = HighlightDriver::new("JS");
        assert!(Arc::ptr_eq(&a.classifier, &b.classifier));
    }

    #[test]
    fn test_empty_window() {
        assert!(highlight_text("", 0, "java").is_empty());
    }
}
