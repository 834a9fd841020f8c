//! The editable-text engine.
//!
//! [`TextCore`] owns the document and keeps everything derived from it in step: the undo
//! history, the highlight spans for the visible window, the soft-wrap layout and the line
//! number map.
//!
//! Every text change funnels through [`TextCore::apply_edit`]. Undo and redo replay history
//! items through the same path with recording suppressed, so a replay never records itself.

use std::ops::Range;

use tracing::{debug, warn};
use viper_highlight::{HighlightDriver, HighlightInfo, Highlighter};

use crate::buffer::Document;
use crate::config::EditorConfig;
use crate::error::{EditError, RestoreError};
use crate::events::{EditorEvent, EventSender};
use crate::history::{EditHistory, EditItem};
use crate::layout::{DEFAULT_TAB_WIDTH, LayoutGeometry, WrapLayout};
use crate::line_ending;
use crate::line_map::{LineMap, LineMapper};
use crate::persist::{self, KeyValueStore};
use crate::search::{self, SearchOptions, SearchResult};
use crate::viewport::{self, CHARS_TO_COLOR, Viewport};

/// Whether applied edits are recorded in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    /// Normal editing: every edit is recorded.
    #[default]
    Recording,
    /// Undo/redo replay: edits are applied but not recorded.
    Suppressed,
}

/// A selection as anchor and head character offsets; the head is the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Fixed end.
    pub anchor: usize,
    /// Moving end (the cursor).
    pub head: usize,
}

impl Selection {
    /// Collapsed selection at `offset`.
    pub fn caret(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// Lower bound.
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Upper bound.
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Returns `true` for a bare caret.
    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    /// Selected range.
    pub fn range(&self) -> Range<usize> {
        self.start()..self.end()
    }
}

/// Document, history, highlighting and line numbering for one open file.
pub struct TextCore {
    document: Document,
    history: EditHistory,
    mode: EditMode,
    highlighter: Box<dyn Highlighter + Send>,
    highlighting: bool,
    chars_to_color: usize,
    spans: Vec<HighlightInfo>,
    highlight_window: Range<usize>,
    viewport: Viewport,
    layout: WrapLayout,
    line_mapper: LineMapper,
    starting_real_line: usize,
    selection: Selection,
    modified: bool,
    read_only: bool,
    history_flags: (bool, bool),
    events: Option<EventSender>,
}

impl std::fmt::Debug for TextCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextCore")
            .field("len_chars", &self.document.len_chars())
            .field("mode", &self.mode)
            .field("selection", &self.selection)
            .field("modified", &self.modified)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

impl Default for TextCore {
    fn default() -> Self {
        Self::new("")
    }
}

impl TextCore {
    /// A core over `text` with default settings and plain-text highlighting.
    pub fn new(text: &str) -> Self {
        Self::with_highlighter(text, Box::new(HighlightDriver::new("")))
    }

    /// A core highlighting with `highlighter`.
    pub fn with_highlighter(text: &str, highlighter: Box<dyn Highlighter + Send>) -> Self {
        let text = line_ending::normalize(text);
        let mut core = Self {
            layout: WrapLayout::new(&text, 80, true, DEFAULT_TAB_WIDTH),
            document: Document::new(&text),
            history: EditHistory::new(Some(30)),
            mode: EditMode::Recording,
            highlighter,
            highlighting: true,
            chars_to_color: CHARS_TO_COLOR,
            spans: Vec::new(),
            highlight_window: 0..0,
            viewport: Viewport::default(),
            line_mapper: LineMapper::new(),
            starting_real_line: 0,
            selection: Selection::default(),
            modified: false,
            read_only: false,
            history_flags: (false, false),
            events: None,
        };
        core.recompute_highlight(None, true);
        core
    }

    /// A core for a file with `extension`, set up from `config`.
    pub fn with_config(text: &str, extension: &str, config: &EditorConfig) -> Self {
        let mut core = Self::with_highlighter(text, Box::new(HighlightDriver::new(extension)));
        core.history.set_max_history_size(config.history_limit());
        core.highlighting = config.syntax_highlight;
        core.chars_to_color = config.chars_to_color.max(1);
        core.read_only = config.read_only;
        core.set_wrap(core.layout.width(), config.wrap_content);
        core.recompute_highlight(None, true);
        core
    }

    /// Send [`EditorEvent`]s through `sender` from now on.
    pub fn set_event_sender(&mut self, sender: EventSender) {
        self.events = Some(sender);
    }

    fn emit(&self, event: EditorEvent) {
        if let Some(events) = &self.events {
            events.send(event);
        }
    }

    // ---- Document --------------------------------------------------------

    /// Replace the whole document with `text`; clears history, cursor and dirty flag.
    pub fn load_text(&mut self, text: &str) {
        let text = line_ending::normalize(text);
        self.document = Document::new(&text);
        self.history.clear();
        self.selection = Selection::default();
        self.modified = false;
        self.rebuild_layout();
        self.emit(EditorEvent::DocumentLoaded {
            len: self.document.len_chars(),
        });
        self.sync_history_flags();
        self.recompute_highlight(None, true);
    }

    /// Current text.
    pub fn text(&self) -> String {
        self.document.text()
    }

    /// Document length in characters.
    pub fn len_chars(&self) -> usize {
        self.document.len_chars()
    }

    /// The document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The undo history.
    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// Current recording mode.
    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Unsaved changes exist.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// The document was written out.
    pub fn mark_saved(&mut self) {
        self.modified = false;
        self.emit(EditorEvent::Saved);
    }

    /// Edits are rejected.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Switch read-only mode.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    // ---- Editing ---------------------------------------------------------

    /// Replace `before`, which must occupy `[start, start + len(before))`, with `after`.
    ///
    /// Recorded in the history unless in [`EditMode::Suppressed`]. `after` is normalized to LF
    /// line endings. The cursor moves to the end of `after` and the highlight window is
    /// recomputed around `start`.
    pub fn apply_edit(&mut self, start: usize, before: &str, after: &str) -> Result<(), EditError> {
        if self.read_only {
            return Err(EditError::ReadOnly);
        }
        let before_len = before.chars().count();
        let len = self.document.len_chars();
        let end = start.checked_add(before_len).filter(|&end| end <= len);
        let Some(end) = end else {
            return Err(EditError::OutOfRange {
                start,
                end: start.saturating_add(before_len),
                len,
            });
        };
        if !self.document.matches_at(start, before) {
            return Err(EditError::Mismatch { start });
        }

        let after = line_ending::normalize(after);
        self.document.replace(start, end, &after)?;
        let after_len = after.chars().count();

        if self.mode == EditMode::Recording {
            self.history.add(EditItem::new(start, before, &after));
            if self.history.can_undo() {
                self.modified = true;
            }
        }

        self.selection = Selection::caret(start + after_len);
        self.layout
            .apply_edit(&self.document, start, before_len, after_len);
        self.line_mapper.invalidate();
        self.emit(EditorEvent::TextChanged {
            start,
            removed: before_len,
            inserted: after_len,
        });
        self.sync_history_flags();
        self.recompute_highlight_at(start);
        Ok(())
    }

    /// Replace `[start, end)` with `text`.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> Result<(), EditError> {
        let len = self.document.len_chars();
        if start > end || end > len {
            return Err(EditError::OutOfRange { start, end, len });
        }
        let before = self.document.slice(start, end);
        self.apply_edit(start, &before, text)
    }

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<(), EditError> {
        self.replace(offset, offset, text)
    }

    /// Delete `[start, end)`.
    pub fn delete(&mut self, start: usize, end: usize) -> Result<(), EditError> {
        self.replace(start, end, "")
    }

    /// Replace the selection with `text` (typing, paste, Tab).
    pub fn type_text(&mut self, text: &str) -> Result<(), EditError> {
        let range = self.selection.range();
        self.replace(range.start, range.end, text)
    }

    /// Delete the selection, or the grapheme cluster before the cursor.
    pub fn backspace(&mut self) -> Result<(), EditError> {
        if !self.selection.is_empty() {
            return self.type_text("");
        }
        let head = self.selection.head;
        if head == 0 {
            return Ok(());
        }
        let start = self.document.prev_grapheme_boundary(head);
        self.delete(start, head)
    }

    /// Delete the selection, or the grapheme cluster after the cursor.
    pub fn delete_forward(&mut self) -> Result<(), EditError> {
        if !self.selection.is_empty() {
            return self.type_text("");
        }
        let head = self.selection.head;
        let end = self.document.next_grapheme_boundary(head);
        if end == head {
            return Ok(());
        }
        self.delete(head, end)
    }

    // ---- History ---------------------------------------------------------

    /// Undo the last recorded edit. Returns `false` if there was nothing to undo.
    ///
    /// The cursor lands at the end of the restored text.
    pub fn undo(&mut self) -> bool {
        if self.read_only || !self.history.can_undo() {
            return false;
        }
        let Some(item) = self.history.get_previous() else {
            return false;
        };
        debug!(start = item.start, "undo");
        if !self.replay(item.start, &item.after, &item.before) {
            self.history.get_next();
            return false;
        }
        self.set_cursor(item.start + item.before_len());
        true
    }

    /// Redo the next edit. Returns `false` if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        if self.read_only || !self.history.can_redo() {
            return false;
        }
        let Some(item) = self.history.get_next() else {
            return false;
        };
        debug!(start = item.start, "redo");
        if !self.replay(item.start, &item.before, &item.after) {
            self.history.get_previous();
            return false;
        }
        self.set_cursor(item.start + item.after_len());
        true
    }

    fn replay(&mut self, start: usize, from: &str, to: &str) -> bool {
        self.mode = EditMode::Suppressed;
        let result = self.apply_edit(start, from, to);
        self.mode = EditMode::Recording;
        match result {
            Ok(()) => {
                self.modified = true;
                true
            }
            Err(err) => {
                warn!(%err, start, "history item does not apply to the document");
                false
            }
        }
    }

    /// Undo is possible.
    pub fn can_undo(&self) -> bool {
        !self.read_only && self.history.can_undo()
    }

    /// Redo is possible.
    pub fn can_redo(&self) -> bool {
        !self.read_only && self.history.can_redo()
    }

    /// Bound the history (`None` = unbounded).
    pub fn set_max_history_size(&mut self, max_size: Option<usize>) {
        self.history.set_max_history_size(max_size);
        self.sync_history_flags();
    }

    /// Forget all history.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.sync_history_flags();
    }

    /// Persist the history under `prefix`.
    pub fn store_persistent_state(&self, store: &mut impl KeyValueStore, prefix: &str) {
        persist::store_history(&self.history, &self.document.text(), store, prefix);
    }

    /// Restore a history stored under `prefix`.
    ///
    /// On any error the history is cleared. An absent history is a success that leaves the
    /// history empty.
    pub fn restore_persistent_state(
        &mut self,
        store: &impl KeyValueStore,
        prefix: &str,
    ) -> Result<(), RestoreError> {
        let restored = persist::restore_history(store, prefix, &self.document.text());
        let result = match restored {
            Ok(Some(history)) => {
                self.history = history;
                Ok(())
            }
            Ok(None) => {
                self.history.clear();
                Ok(())
            }
            Err(err) => {
                debug!(%err, prefix, "persisted history rejected");
                self.history.clear();
                Err(err)
            }
        };
        self.sync_history_flags();
        result
    }

    fn sync_history_flags(&mut self) {
        let flags = (self.history.can_undo(), self.history.can_redo());
        if flags != self.history_flags {
            self.history_flags = flags;
            self.emit(EditorEvent::HistoryChanged {
                can_undo: flags.0,
                can_redo: flags.1,
            });
        }
    }

    // ---- Selection -------------------------------------------------------

    /// Current selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Caret offset.
    pub fn cursor(&self) -> usize {
        self.selection.head
    }

    /// Set the selection; both ends are clamped to the document.
    pub fn set_selection(&mut self, anchor: usize, head: usize) {
        let len = self.document.len_chars();
        self.selection = Selection {
            anchor: anchor.min(len),
            head: head.min(len),
        };
    }

    /// Collapse the selection to a caret at `offset` (clamped).
    pub fn set_cursor(&mut self, offset: usize) {
        self.set_selection(offset, offset);
    }

    fn move_head(&mut self, head: usize, extend: bool) {
        let anchor = if extend { self.selection.anchor } else { head };
        self.set_selection(anchor, head);
    }

    /// Move one grapheme cluster left.
    pub fn move_left(&mut self, extend: bool) {
        if !extend && !self.selection.is_empty() {
            self.set_cursor(self.selection.start());
            return;
        }
        let head = self.document.prev_grapheme_boundary(self.selection.head);
        self.move_head(head, extend);
    }

    /// Move one grapheme cluster right.
    pub fn move_right(&mut self, extend: bool) {
        if !extend && !self.selection.is_empty() {
            self.set_cursor(self.selection.end());
            return;
        }
        let head = self.document.next_grapheme_boundary(self.selection.head);
        self.move_head(head, extend);
    }

    /// Move `delta` visual lines up (negative) or down, keeping the column where possible.
    pub fn move_vertical(&mut self, delta: isize, extend: bool) {
        let head = self.selection.head;
        let line = self.layout.line_of_offset(head);
        let column = head - self.layout.line_start(line);
        let last = self.layout.visual_line_count().saturating_sub(1);
        let target = line.saturating_add_signed(delta).min(last);
        if target == line {
            return;
        }
        let start = self.layout.line_start(target);
        let mut end = self.layout.line_end(target);
        if end > start && self.document.rope().char(end - 1) == '\n' {
            end -= 1;
        }
        self.move_head((start + column).min(end), extend);
    }

    /// Move to the start of the visual line.
    pub fn move_line_start(&mut self, extend: bool) {
        let line = self.layout.line_of_offset(self.selection.head);
        self.move_head(self.layout.line_start(line), extend);
    }

    /// Move to the end of the visual line (before its line break).
    pub fn move_line_end(&mut self, extend: bool) {
        let line = self.layout.line_of_offset(self.selection.head);
        let start = self.layout.line_start(line);
        let mut end = self.layout.line_end(line);
        if end > start && self.document.rope().char(end - 1) == '\n' {
            end -= 1;
        }
        self.move_head(end, extend);
    }

    // ---- Layout and line numbers -----------------------------------------

    /// Soft-wrap settings. A width of 0 disables wrapping.
    pub fn set_wrap(&mut self, width: usize, wrap: bool) {
        if width == self.layout.width() && wrap == self.layout.wrap() {
            return;
        }
        self.layout = WrapLayout::new(
            &self.document.text(),
            width,
            wrap,
            self.layout.tab_width(),
        );
        self.line_mapper.invalidate();
    }

    /// Current layout.
    pub fn layout(&self) -> &WrapLayout {
        &self.layout
    }

    fn rebuild_layout(&mut self) {
        self.layout = WrapLayout::new(
            &self.document.text(),
            self.layout.width(),
            self.layout.wrap(),
            self.layout.tab_width(),
        );
        self.line_mapper.invalidate();
    }

    /// Real lines preceding this document (for paged documents).
    pub fn set_starting_real_line(&mut self, line: usize) {
        self.starting_real_line = line;
    }

    /// Line numbering for the current layout.
    pub fn line_map(&mut self) -> &LineMap {
        let wrap = self.layout.wrap();
        self.line_mapper.update(
            self.starting_real_line,
            self.layout.visual_line_count(),
            &self.layout,
            &self.document,
            wrap,
        )
    }

    // ---- Highlighting ----------------------------------------------------

    /// Use `highlighter` from now on and re-highlight.
    pub fn set_highlighter(&mut self, highlighter: Box<dyn Highlighter + Send>) {
        self.highlighter = highlighter;
        self.refresh_highlight();
    }

    /// Highlight as the language of `extension`.
    pub fn set_extension(&mut self, extension: &str) {
        self.set_highlighter(Box::new(HighlightDriver::new(extension)));
    }

    /// Turn highlighting on or off; spans are empty while off.
    pub fn set_highlighting(&mut self, enabled: bool) {
        self.highlighting = enabled;
        self.refresh_highlight();
    }

    /// Highlight budget in characters (at least 1).
    pub fn set_chars_to_color(&mut self, chars: usize) {
        self.chars_to_color = chars.max(1);
    }

    /// Store the renderer's scroll geometry and re-highlight the visible window.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.refresh_highlight();
    }

    /// Last reported viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Re-highlight the window around the current viewport.
    pub fn refresh_highlight(&mut self) {
        let visible = viewport::visible_char_range(&self.layout, &self.viewport);
        self.recompute_highlight(visible, false);
    }

    /// Recompute spans for the window derived from `visible` (the on-screen character range).
    ///
    /// All earlier spans are dropped.
    pub fn recompute_highlight(&mut self, visible: Option<Range<usize>>, fresh_load: bool) {
        let len = self.document.len_chars();
        let window = viewport::highlight_window(len, visible, fresh_load, self.chars_to_color);
        self.spans.clear();
        if self.highlighting && !window.is_empty() {
            let text = self.document.slice(window.start, window.end);
            self.spans = self.highlighter.highlight(&text, window.start);
        }
        self.highlight_window = window.clone();
        self.emit(EditorEvent::HighlightUpdated { window });
    }

    // An edit off screen moves the window so it starts at the edit.
    fn recompute_highlight_at(&mut self, start: usize) {
        let visible = viewport::visible_char_range(&self.layout, &self.viewport).map(|range| {
            if range.contains(&start) || start == range.end {
                range
            } else {
                start..start + range.len()
            }
        });
        self.recompute_highlight(visible, false);
    }

    /// Spans of the last highlight pass, sorted and non-overlapping.
    pub fn spans(&self) -> &[HighlightInfo] {
        &self.spans
    }

    /// Window covered by [`Self::spans`].
    pub fn highlight_window(&self) -> Range<usize> {
        self.highlight_window.clone()
    }

    // ---- Find/replace ----------------------------------------------------

    /// Start offsets of `query` in the document.
    pub fn search(&self, query: &str, options: SearchOptions) -> Vec<usize> {
        search::search(&self.document.text(), query, options)
    }

    /// Find `query` and select the first match.
    pub fn find(&mut self, query: &str, replacement: Option<String>, options: SearchOptions) -> SearchResult {
        let matches = search::find_matches(&self.document.text(), query, options);
        let result = SearchResult::new(matches, query, replacement, options.regex);
        self.select_current(&result);
        self.emit(EditorEvent::SearchFinished {
            matches: result.len(),
        });
        result
    }

    /// Select the current match of `result`, if any.
    pub fn select_current(&mut self, result: &SearchResult) {
        if let Some(m) = result.current() {
            self.set_selection(m.start, m.end);
        }
    }

    /// Replace the current match with the replacement text (inserted literally) and move on
    /// to the next match, or the previous one when it was the last.
    ///
    /// Returns `Ok(false)` when nothing could be replaced.
    pub fn replace_current_match(&mut self, result: &mut SearchResult) -> Result<bool, EditError> {
        if !result.can_replace_something() {
            return Ok(false);
        }
        let Some(current) = result.current() else {
            return Ok(false);
        };
        let replacement = result.replacement.clone();
        self.replace(current.start, current.end, &replacement)?;
        result.done_replace();
        if result.next_match().is_none() {
            result.previous_match();
        }
        self.select_current(result);
        Ok(true)
    }

    /// Replace every match as a single undoable edit. Returns the replacement count.
    pub fn replace_all(
        &mut self,
        query: &str,
        replacement: &str,
        options: SearchOptions,
    ) -> Result<usize, EditError> {
        let text = self.document.text();
        let (replaced, count) = search::replace_all(&text, query, replacement, options);
        if count == 0 {
            return Ok(0);
        }
        let cursor = self.selection.head;
        self.apply_edit(0, &text, &replaced)?;
        self.set_cursor(cursor);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::persist::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};
    use viper_highlight::ColorCategory;

    #[test]
    fn test_undo_restores_and_places_cursor_after_before_text() {
        let mut core = TextCore::new("hello world");
        core.replace(0, 5, "bye").unwrap();
        assert_eq!(core.text(), "bye world");
        assert_eq!(core.cursor(), 3);

        assert!(core.undo());
        assert_eq!(core.text(), "hello world");
        assert_eq!(core.cursor(), 5);
        assert_eq!(core.mode(), EditMode::Recording);

        assert!(core.redo());
        assert_eq!(core.text(), "bye world");
        assert_eq!(core.cursor(), 3);
        assert!(!core.redo());
    }

    #[test]
    fn test_replay_is_not_recorded() {
        let mut core = TextCore::new("");
        core.insert(0, "a").unwrap();
        core.insert(1, "b").unwrap();
        core.undo();
        assert_eq!(core.history().len(), 2);
        assert_eq!(core.history().position(), 1);
    }

    #[test]
    fn test_apply_edit_rejects_mismatch() {
        let mut core = TextCore::new("abc");
        assert_eq!(core.apply_edit(0, "x", "y"), Err(EditError::Mismatch { start: 0 }));
        assert!(matches!(core.apply_edit(2, "cd", ""), Err(EditError::OutOfRange { .. })));
        assert!(!core.can_undo());
    }

    #[test]
    fn test_read_only() {
        let mut core = TextCore::new("abc");
        core.insert(0, "x").unwrap();
        core.set_read_only(true);
        assert_eq!(core.insert(0, "y"), Err(EditError::ReadOnly));
        assert!(!core.undo());
        assert_eq!(core.text(), "xabc");
    }

    #[test]
    fn test_type_text_replaces_selection() {
        let mut core = TextCore::new("one two");
        core.set_selection(7, 4);
        core.type_text("2").unwrap();
        assert_eq!(core.text(), "one 2");
        assert_eq!(core.cursor(), 5);
    }

    #[test]
    fn test_backspace_removes_whole_cluster() {
        let mut core = TextCore::new("ae\u{301}");
        core.set_cursor(3);
        core.backspace().unwrap();
        assert_eq!(core.text(), "a");
        core.backspace().unwrap();
        core.backspace().unwrap();
        assert_eq!(core.text(), "");
    }

    #[test]
    fn test_cursor_movement() {
        let mut core = TextCore::new("abc\nde");
        core.set_cursor(2);
        core.move_vertical(1, false);
        assert_eq!(core.cursor(), 6);
        core.move_vertical(-1, false);
        assert_eq!(core.cursor(), 2);
        core.move_right(true);
        assert_eq!(core.selection().range(), 2..3);
        core.move_left(false);
        assert_eq!(core.cursor(), 2);
        core.move_line_end(false);
        assert_eq!(core.cursor(), 3);
        core.move_line_start(false);
        assert_eq!(core.cursor(), 0);
    }

    #[test]
    fn test_modified_flag() {
        let mut core = TextCore::new("x");
        assert!(!core.is_modified());
        core.insert(1, "y").unwrap();
        assert!(core.is_modified());
        core.mark_saved();
        assert!(!core.is_modified());
        core.load_text("new");
        assert!(!core.is_modified());
        assert!(!core.can_undo());
    }

    #[test]
    fn test_fresh_load_highlights_prefix_only() {
        let text = "int x;\n".repeat(1000);
        let core = TextCore::with_highlighter(&text, Box::new(HighlightDriver::new("java")));
        assert_eq!(core.highlight_window(), 0..CHARS_TO_COLOR);
        assert!(core.spans().iter().all(|s| s.end <= CHARS_TO_COLOR));
        assert_eq!(core.spans()[0], HighlightInfo::new(0, 3, ColorCategory::Keyword));
    }

    #[test]
    fn test_edit_off_screen_moves_window() {
        let text = "x\n".repeat(5000);
        let mut core = TextCore::new(&text);
        core.set_wrap(80, false);
        core.set_viewport(Viewport::rows(0, 10, core.layout().visual_line_count()));
        assert_eq!(core.highlight_window(), 0..20);

        core.insert(8000, "y").unwrap();
        assert_eq!(core.highlight_window(), 7500..8020);
    }

    #[test]
    fn test_highlighting_disabled() {
        let mut core = TextCore::with_highlighter("int x", Box::new(HighlightDriver::new("c")));
        assert!(!core.spans().is_empty());
        core.set_highlighting(false);
        assert!(core.spans().is_empty());
    }

    #[test]
    fn test_restore_guards_hash_and_clears() {
        let mut core = TextCore::new("foo");
        core.insert(3, "!").unwrap();
        let mut store = MemoryStore::new();
        core.store_persistent_state(&mut store, "doc");

        let mut same = TextCore::new("foo!");
        same.restore_persistent_state(&store, "doc").unwrap();
        assert!(same.can_undo());
        assert!(same.undo());
        assert_eq!(same.text(), "foo");

        let mut other = TextCore::new("bar");
        other.insert(0, "x").unwrap();
        assert!(other.restore_persistent_state(&store, "doc").is_err());
        assert!(!other.can_undo());
        assert!(other.history().is_empty());
    }

    #[test]
    fn test_replace_current_match_walks_matches() {
        let mut core = TextCore::new("ab ab ab");
        let mut result = core.find("ab", Some("x".into()), SearchOptions::default());
        assert_eq!(core.selection().range(), 0..2);

        assert!(core.replace_current_match(&mut result).unwrap());
        assert_eq!(core.text(), "x ab ab");
        assert_eq!(core.selection().range(), 2..4);

        assert!(core.replace_current_match(&mut result).unwrap());
        assert!(core.replace_current_match(&mut result).unwrap());
        assert_eq!(core.text(), "x x x");
        assert!(!core.replace_current_match(&mut result).unwrap());
    }

    #[test]
    fn test_replace_all_is_one_undo_step() {
        let mut core = TextCore::new("a-a-a");
        assert_eq!(core.replace_all("a", "bb", SearchOptions::default()).unwrap(), 3);
        assert_eq!(core.text(), "bb-bb-bb");
        assert!(core.undo());
        assert_eq!(core.text(), "a-a-a");
        assert!(!core.can_undo());
    }

    #[test]
    fn test_events_follow_edits() {
        let mut bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(move |event| {
            if !matches!(event, EditorEvent::HighlightUpdated { .. }) {
                sink.lock().unwrap().push(event.clone());
            }
        });

        let mut core = TextCore::new("");
        core.set_event_sender(bus.sender());
        core.insert(0, "hi").unwrap();
        core.insert(2, "!").unwrap();
        core.undo();
        bus.dispatch();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                EditorEvent::TextChanged { start: 0, removed: 0, inserted: 2 },
                EditorEvent::HistoryChanged { can_undo: true, can_redo: false },
                EditorEvent::TextChanged { start: 2, removed: 0, inserted: 1 },
                EditorEvent::TextChanged { start: 2, removed: 1, inserted: 0 },
                EditorEvent::HistoryChanged { can_undo: true, can_redo: true },
            ]
        );
    }

    #[test]
    fn test_apply_edit_with_huge_start_is_out_of_range() {
        let mut core = TextCore::new("abc");
        let err = core.apply_edit(usize::MAX, "x", "y").unwrap_err();
        assert!(matches!(err, EditError::OutOfRange { len: 3, .. }));
        assert_eq!(core.text(), "abc");
    }

    #[test]
    fn test_apply_edit_normalizes_line_endings() {
        let mut core = TextCore::new("ab");
        core.apply_edit(1, "", "\r\nx\r").unwrap();
        assert_eq!(core.text(), "a\nx\nb");
        assert_eq!(core.cursor(), 4);
        assert!(core.undo());
        assert_eq!(core.text(), "ab");
    }

    #[test]
    fn test_layout_tracks_edits_incrementally() {
        let mut core = TextCore::new("first line\nsecond\nthird line here");
        core.set_wrap(6, true);
        core.insert(3, "\nsplit").unwrap();
        core.delete(0, 2).unwrap();
        core.type_text("wider than six").unwrap();
        assert!(core.undo());

        let full = WrapLayout::new(&core.text(), 6, true, DEFAULT_TAB_WIDTH);
        assert_eq!(core.layout(), &full);
        assert_eq!(core.line_map().len(), full.visual_line_count());
    }
}

