//! Layout geometry and soft wrapping.
//!
//! Computes where each visual line starts for a given container width. Character widths follow
//! UAX #11; wide characters and grapheme clusters are never split across visual lines.

use ropey::Rope;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use crate::buffer::Document;

/// Default tab width (in cells) used when a caller does not specify a tab width.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Geometry of laid-out text, as supplied by a renderer.
///
/// Visual lines include soft-wrap continuation lines. Offsets are character offsets.
pub trait LayoutGeometry {
    /// Number of visual lines (at least 1).
    fn visual_line_count(&self) -> usize;

    /// Character offset at which visual line `line` starts.
    fn line_start(&self, line: usize) -> usize;

    /// Exclusive end of visual line `line`; includes the trailing `'\n'` if there is one.
    fn line_end(&self, line: usize) -> usize;

    /// Visual line containing `offset`. Offsets past the end map to the last line.
    fn line_of_offset(&self, offset: usize) -> usize {
        let count = self.visual_line_count();
        let mut lo = 0;
        let mut hi = count;
        while lo + 1 < hi {
            let mid = (lo + hi) / 2;
            if self.line_start(mid) <= offset {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo.min(count.saturating_sub(1))
    }
}

/// Calculate visual width of a character (based on UAX #11)
///
/// Return value:
/// - 1: Narrow character (ASCII, etc.)
/// - 2: Wide character (CJK, fullwidth, etc.)
/// - 0: Zero-width character (combining characters, etc.)
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(1)
}

/// Visual width (in cells) for a character at a specific cell offset within the line.
///
/// `'\t'` advances to the next tab stop based on `tab_width`.
pub fn cell_width_at(ch: char, cell_offset_in_line: usize, tab_width: usize) -> usize {
    if ch == '\t' {
        let tab_width = tab_width.max(1);
        tab_width - cell_offset_in_line % tab_width
    } else {
        char_width(ch)
    }
}

/// Total visual width of a string, interpreting `'\t'` using `tab_width`.
pub fn str_width_with_tab_width(s: &str, tab_width: usize) -> usize {
    let mut x = 0usize;
    for ch in s.chars() {
        x = x.saturating_add(cell_width_at(ch, x, tab_width));
    }
    x
}

/// Character indices (within `line`) at which soft wraps occur.
///
/// `line` must not contain `'\n'`. A width of 0 disables wrapping.
pub fn wrap_points(line: &str, width: usize, tab_width: usize) -> Vec<usize> {
    let mut points = Vec::new();
    if width == 0 {
        return points;
    }

    let mut x_in_segment = 0usize;
    let mut x_in_line = 0usize;
    let mut char_index = 0usize;

    for grapheme in line.graphemes(true) {
        let mut cluster_width = 0usize;
        let mut cluster_chars = 0usize;
        for ch in grapheme.chars() {
            cluster_width += cell_width_at(ch, x_in_line + cluster_width, tab_width);
            cluster_chars += 1;
        }

        // A cluster that does not fit moves intact to the next visual line.
        if x_in_segment > 0 && x_in_segment + cluster_width > width {
            points.push(char_index);
            x_in_segment = 0;
        }

        x_in_segment += cluster_width;
        x_in_line += cluster_width;
        char_index += cluster_chars;
    }

    points
}

/// Soft-wrapped layout of a whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapLayout {
    starts: Vec<usize>,
    len: usize,
    width: usize,
    wrap: bool,
    tab_width: usize,
}

impl WrapLayout {
    /// Lay out `text` for a container `width` cells wide.
    ///
    /// With `wrap == false` (or a width of 0) every real line is one visual line.
    pub fn new(text: &str, width: usize, wrap: bool, tab_width: usize) -> Self {
        let mut layout = Self {
            starts: Vec::new(),
            len: text.chars().count(),
            width,
            wrap,
            tab_width,
        };
        layout.starts = layout.lay_out_lines(text, 0);
        layout
    }

    /// Visual line starts for `text`, a run of whole real lines beginning at `offset`.
    fn lay_out_lines(&self, text: &str, mut offset: usize) -> Vec<usize> {
        let effective_width = if self.wrap { self.width } else { 0 };
        let mut starts = Vec::new();
        for line in text.split('\n') {
            starts.push(offset);
            starts.extend(
                wrap_points(line, effective_width, self.tab_width)
                    .into_iter()
                    .map(|p| offset + p),
            );
            offset += line.chars().count() + 1;
        }
        starts
    }

    /// Update the layout after `removed` characters at `start` were replaced by `inserted`
    /// characters. `document` holds the edited text.
    ///
    /// Only the real lines touched by the edit are wrapped again; visual lines after them are
    /// shifted by the length change.
    pub fn apply_edit(&mut self, document: &Document, start: usize, removed: usize, inserted: usize) {
        let rope = document.rope();
        let new_len = rope.len_chars();
        let start = start.min(new_len);
        let region_start = real_line_start(rope, start);
        // Position of the '\n' closing the last touched line, or the end of the text.
        let region_end = real_line_end(rope, (start + inserted).min(new_len));
        let old_region_end = region_end - inserted + removed;

        let head = self.starts.partition_point(|&s| s < region_start);
        let tail = self.starts.partition_point(|&s| s <= old_region_end);
        let fresh = self.lay_out_lines(&document.slice(region_start, region_end), region_start);

        for s in &mut self.starts[tail..] {
            *s = *s - removed + inserted;
        }
        self.starts.splice(head..tail, fresh);
        self.len = new_len;
    }

    /// Container width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether soft wrapping is enabled.
    pub fn wrap(&self) -> bool {
        self.wrap
    }

    /// Tab width in cells.
    pub fn tab_width(&self) -> usize {
        self.tab_width
    }

    /// Start offsets of every visual line.
    pub fn line_starts(&self) -> &[usize] {
        &self.starts
    }
}

fn real_line_start(rope: &Rope, offset: usize) -> usize {
    let mut chars = rope.chars_at(offset);
    let mut pos = offset;
    while let Some(ch) = chars.prev() {
        if ch == '\n' {
            break;
        }
        pos -= 1;
    }
    pos
}

fn real_line_end(rope: &Rope, offset: usize) -> usize {
    offset
        + rope
            .chars_at(offset)
            .take_while(|&ch| ch != '\n')
            .count()
}

impl LayoutGeometry for WrapLayout {
    fn visual_line_count(&self) -> usize {
        self.starts.len()
    }

    fn line_start(&self, line: usize) -> usize {
        self.starts.get(line).copied().unwrap_or(self.len)
    }

    fn line_end(&self, line: usize) -> usize {
        self.starts.get(line + 1).copied().unwrap_or(self.len)
    }

    fn line_of_offset(&self, offset: usize) -> usize {
        self.starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_char_width() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width('你'), 2);
        assert_eq!(char_width('\u{301}'), 0);
    }

    #[test]
    fn test_tab_stops() {
        assert_eq!(cell_width_at('\t', 0, 4), 4);
        assert_eq!(cell_width_at('\t', 3, 4), 1);
        assert_eq!(str_width_with_tab_width("a\tb", 4), 5);
    }

    #[test]
    fn test_wrap_points_ascii() {
        assert_eq!(wrap_points("abcdefg", 3, 4), vec![3, 6]);
        assert_eq!(wrap_points("abc", 3, 4), Vec::<usize>::new());
        assert_eq!(wrap_points("abc", 0, 4), Vec::<usize>::new());
    }

    #[test]
    fn test_wide_char_moves_to_next_line() {
        // "a你" is 3 cells; with width 2 the wide char cannot be split.
        assert_eq!(wrap_points("a你b", 2, 4), vec![1, 2]);
    }

    #[test]
    fn test_combining_cluster_is_not_split() {
        assert_eq!(wrap_points("ae\u{301}", 1, 4), vec![1]);
    }

    #[test]
    fn test_wrap_layout_lines() {
        let layout = WrapLayout::new("ab\ncdef\ngh", 2, true, 4);
        assert_eq!(layout.line_starts(), &[0, 3, 5, 8]);
        assert_eq!(layout.line_end(0), 3);
        assert_eq!(layout.line_end(1), 5);
        assert_eq!(layout.line_end(3), 10);
        assert_eq!(layout.line_of_offset(4), 1);
        assert_eq!(layout.line_of_offset(99), 3);
    }

    #[test]
    fn test_no_wrap_layout() {
        let layout = WrapLayout::new("ab\ncdef\ngh", 2, false, 4);
        assert_eq!(layout.visual_line_count(), 3);
    }

    #[test]
    fn test_empty_text_has_one_line() {
        let layout = WrapLayout::new("", 80, true, 4);
        assert_eq!(layout.visual_line_count(), 1);
        assert_eq!(layout.line_start(0), 0);
        assert_eq!(layout.line_end(0), 0);
    }

    fn edited(text: &str, start: usize, removed: usize, inserted: &str) -> (WrapLayout, Document) {
        let mut layout = WrapLayout::new(text, 3, true, 4);
        let mut document = Document::new(text);
        document.replace(start, start + removed, inserted).unwrap();
        layout.apply_edit(&document, start, removed, inserted.chars().count());
        (layout, document)
    }

    #[test]
    fn test_edit_rewraps_touched_line_and_shifts_rest() {
        let (layout, document) = edited("ab\ncd\nef", 4, 0, "xyz");
        assert_eq!(document.text(), "ab\ncxyzd\nef");
        assert_eq!(layout, WrapLayout::new(&document.text(), 3, true, 4));
        assert_eq!(layout.line_starts(), &[0, 3, 6, 9]);
    }

    #[test]
    fn test_edit_joining_and_splitting_lines() {
        let (joined, document) = edited("abc\ndef\n", 2, 3, "");
        assert_eq!(joined, WrapLayout::new(&document.text(), 3, true, 4));

        let (split, document) = edited("abcdef", 3, 0, "\n\n");
        assert_eq!(split, WrapLayout::new(&document.text(), 3, true, 4));

        let (emptied, document) = edited("ab\n", 0, 3, "");
        assert_eq!(emptied, WrapLayout::new(&document.text(), 3, true, 4));
        assert_eq!(emptied.visual_line_count(), 1);
    }

    proptest! {
        #[test]
        fn prop_incremental_edit_matches_full_layout(
            text in "[ab你\t\n]{0,40}",
            start_seed in 0usize..100,
            removed_seed in 0usize..100,
            inserted in "[xy\n]{0,6}",
            wrap in any::<bool>(),
        ) {
            let len = text.chars().count();
            let start = start_seed % (len + 1);
            let removed = removed_seed % (len - start + 1);

            let mut layout = WrapLayout::new(&text, 3, wrap, 4);
            let mut document = Document::new(&text);
            document.replace(start, start + removed, &inserted).unwrap();
            layout.apply_edit(&document, start, removed, inserted.chars().count());

            prop_assert_eq!(layout, WrapLayout::new(&document.text(), 3, wrap, 4));
        }
    }
}
