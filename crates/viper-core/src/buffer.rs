//! Document buffer.
//!
//! Text is stored in a [`Rope`] with LF newlines. All offsets are **character offsets**
//! (Unicode scalar values).

use ropey::Rope;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::EditError;

/// The mutable document text owned by [`crate::TextCore`].
#[derive(Debug, Clone, Default)]
pub struct Document {
    rope: Rope,
}

impl Document {
    /// Create a document from LF-normalized text.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Length in characters.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns `true` if the document has no text.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Number of real lines (N newlines => N+1 lines).
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Full text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Text of `[start, end)`, clamped to the document.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let len = self.len_chars();
        let end = end.min(len);
        let start = start.min(end);
        self.rope.slice(start..end).to_string()
    }

    /// Number of `'\n'` characters before `offset` (the 0-based real line of `offset`).
    pub fn line_of_char(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.len_chars()))
    }

    /// Character offset of the start of real line `line` (0-based), clamped.
    pub fn line_to_char(&self, line: usize) -> usize {
        if line >= self.len_lines() {
            return self.len_chars();
        }
        self.rope.line_to_char(line)
    }

    /// Returns `true` if `text` occurs at `start`.
    pub fn matches_at(&self, start: usize, text: &str) -> bool {
        let len = text.chars().count();
        start + len <= self.len_chars()
            && self
                .rope
                .slice(start..start + len)
                .chars()
                .eq(text.chars())
    }

    /// Replace `[start, end)` with `text`.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> Result<(), EditError> {
        let len = self.len_chars();
        if start > end || end > len {
            return Err(EditError::OutOfRange { start, end, len });
        }
        if start < end {
            self.rope.remove(start..end);
        }
        if !text.is_empty() {
            self.rope.insert(start, text);
        }
        Ok(())
    }

    /// Start of the grapheme cluster before `offset` (0 at the start of the document).
    pub fn prev_grapheme_boundary(&self, offset: usize) -> usize {
        let offset = offset.min(self.len_chars());
        let line_start = self.line_to_char(self.line_of_char(offset));
        if offset == line_start {
            return offset.saturating_sub(1);
        }
        let line = self.slice(line_start, offset);
        let last = line
            .grapheme_indices(true)
            .next_back()
            .map_or(0, |(byte, _)| line[..byte].chars().count());
        line_start + last
    }

    /// End of the grapheme cluster at `offset` (the document length at the end).
    pub fn next_grapheme_boundary(&self, offset: usize) -> usize {
        let len = self.len_chars();
        if offset >= len {
            return len;
        }
        let line = self.line_of_char(offset);
        let line_end = self.line_to_char(line + 1);
        let rest = self.slice(offset, line_end);
        match rest.graphemes(true).next() {
            Some(cluster) => offset + cluster.chars().count(),
            None => offset + 1,
        }
    }

    /// Underlying rope.
    pub fn rope(&self) -> &Rope {
        &self.rope
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
