//! Viewport math: visible lines, visible character range and the highlight window.
//!
//! All functions here clamp instead of failing. Division by a zero height yields `None`.

use std::ops::Range;

use tracing::trace;

use crate::layout::LayoutGeometry;

/// Default highlight budget in characters.
pub const CHARS_TO_COLOR: usize = 2500;

/// Scroll geometry supplied by the renderer. Units are pixels or rows, as long as they are
/// consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Vertical scroll offset of the content.
    pub scroll_y: usize,
    /// Visible height of the editor; 0 while unknown.
    pub height: usize,
    /// Total height of the laid-out content.
    pub content_height: usize,
    /// Height of the screen (may exceed `height`).
    pub screen_height: usize,
}

impl Viewport {
    /// A viewport measured in rows: one row per visual line, `rows` visible.
    pub fn rows(scroll_row: usize, rows: usize, visual_line_count: usize) -> Self {
        Self {
            scroll_y: scroll_row,
            height: rows,
            content_height: visual_line_count,
            screen_height: rows,
        }
    }

    /// Returns `true` once the renderer has reported a height.
    pub fn is_known(&self) -> bool {
        self.height > 0 && self.content_height > 0
    }
}

/// First visible visual line: `scroll_y * line_count / content_height`.
pub fn first_visible_line(scroll_y: usize, content_height: usize, line_count: usize) -> Option<usize> {
    if content_height == 0 {
        return None;
    }
    Some(scroll_y.saturating_mul(line_count) / content_height)
}

/// One past the last visible visual line, capped at `line_count`.
pub fn last_visible_line(
    scroll_y: usize,
    content_height: usize,
    line_count: usize,
    screen_height: usize,
) -> Option<usize> {
    if content_height == 0 {
        return None;
    }
    let line = scroll_y.saturating_add(screen_height).saturating_mul(line_count) / content_height;
    Some(line.min(line_count))
}

/// Vertical position of the top of `line`.
pub fn y_at_line(content_height: usize, line_count: usize, line: usize) -> Option<usize> {
    if line_count == 0 {
        return None;
    }
    Some(content_height / line_count * line)
}

/// Character range shown by `viewport`, or `None` while the height is unknown.
pub fn visible_char_range(layout: &impl LayoutGeometry, viewport: &Viewport) -> Option<Range<usize>> {
    if !viewport.is_known() {
        return None;
    }
    let line_count = layout.visual_line_count();
    let first = first_visible_line(viewport.scroll_y, viewport.content_height, line_count)?;
    let last = last_visible_line(
        viewport.scroll_y,
        viewport.content_height,
        line_count,
        viewport.screen_height,
    )?;

    let first = first.min(line_count.saturating_sub(1));
    let start = layout.line_start(first);
    let end = layout.line_end(last.saturating_sub(1)).max(start);
    Some(start..end)
}

/// The character window to re-highlight.
///
/// A fresh load, or an unknown viewport, colors `[0, chars_to_color)`. Otherwise the visible
/// range is widened on the left by `chars_to_color / 5` so multi-line constructs that start
/// above the screen are seen. Bounds are clamped to `[0, doc_len]` and `start <= end`.
pub fn highlight_window(
    doc_len: usize,
    visible: Option<Range<usize>>,
    fresh_load: bool,
    chars_to_color: usize,
) -> Range<usize> {
    let (first_visible, last_visible) = match visible {
        Some(range) if !fresh_load => (range.start, range.end),
        _ => (0, chars_to_color),
    };

    let end = last_visible.min(doc_len);
    let start = first_visible.saturating_sub(chars_to_color / 5).min(end);
    trace!(doc_len, start, end, fresh_load, "highlight window");
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::WrapLayout;

    #[test]
    fn test_fresh_load_window() {
        assert_eq!(highlight_window(10_000, Some(5000..6000), true, 2500), 0..2500);
        assert_eq!(highlight_window(100, None, false, 2500), 0..100);
    }

    #[test]
    fn test_window_is_widened_left() {
        assert_eq!(highlight_window(10_000, Some(5000..6000), false, 2500), 4500..6000);
        assert_eq!(highlight_window(10_000, Some(100..600), false, 2500), 0..600);
    }

    #[test]
    fn test_window_never_inverts() {
        let window = highlight_window(50, Some(900..1000), false, 2500);
        assert_eq!(window, 50..50);
    }

    #[test]
    fn test_visible_lines() {
        assert_eq!(first_visible_line(100, 1000, 50), Some(5));
        assert_eq!(last_visible_line(100, 1000, 50, 200), Some(15));
        assert_eq!(last_visible_line(900, 1000, 50, 200), Some(50));
        assert_eq!(first_visible_line(0, 0, 50), None);
        assert_eq!(y_at_line(1000, 50, 5), Some(100));
        assert_eq!(y_at_line(1000, 0, 5), None);
    }

    #[test]
    fn test_visible_char_range_rows() {
        let text = "l0\nl1\nl2\nl3\nl4";
        let layout = WrapLayout::new(text, 80, true, 4);
        let viewport = Viewport::rows(1, 2, layout.visual_line_count());
        assert_eq!(visible_char_range(&layout, &viewport), Some(3..9));
        assert_eq!(visible_char_range(&layout, &Viewport::default()), None);
    }
}
