//! Linear undo/redo history.
//!
//! The history is a list of [`EditItem`]s plus a cursor (`position`):
//! entries before the cursor can be undone, entries at or after it can be redone.
//! Adding an entry while redo is possible discards the redo tail; there are no branches.

use tracing::trace;

/// One atomic text replacement: `before` at `start` was replaced by `after`.
///
/// Offsets and lengths are in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditItem {
    /// Start character offset.
    pub start: usize,
    /// Replaced text.
    pub before: String,
    /// Inserted text.
    pub after: String,
}

impl EditItem {
    /// Create an edit item.
    pub fn new(start: usize, before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            start,
            before: before.into(),
            after: after.into(),
        }
    }

    /// Length of `before` in characters.
    pub fn before_len(&self) -> usize {
        self.before.chars().count()
    }

    /// Length of `after` in characters.
    pub fn after_len(&self) -> usize {
        self.after.chars().count()
    }
}

/// Bounded, position-indexed undo/redo log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditHistory {
    entries: Vec<EditItem>,
    position: usize,
    max_size: Option<usize>,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(None)
    }
}

impl EditHistory {
    /// Create an empty history. `None` means unbounded.
    pub fn new(max_size: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            position: 0,
            max_size,
        }
    }

    /// Record `item` at the cursor, dropping the redo tail.
    pub fn add(&mut self, item: EditItem) {
        self.entries.truncate(self.position);
        self.entries.push(item);
        self.position += 1;
        self.trim();
    }

    /// Step back and return the entry to undo, or `None` when nothing can be undone.
    pub fn get_previous(&mut self) -> Option<EditItem> {
        if self.position == 0 {
            return None;
        }
        self.position -= 1;
        self.entries.get(self.position).cloned()
    }

    /// Return the entry to redo and step forward, or `None` when nothing can be redone.
    pub fn get_next(&mut self) -> Option<EditItem> {
        let item = self.entries.get(self.position).cloned()?;
        self.position += 1;
        Some(item)
    }

    /// `position > 0`.
    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    /// `position < len`.
    pub fn can_redo(&self) -> bool {
        self.position < self.entries.len()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.position = 0;
    }

    /// Change the bound, evicting the oldest entries immediately if needed.
    pub fn set_max_history_size(&mut self, max_size: Option<usize>) {
        self.max_size = max_size;
        self.trim();
    }

    /// Current bound (`None` = unbounded).
    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    /// Cursor into [`Self::entries`].
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[EditItem] {
        &self.entries
    }

    /// Rebuild a history from persisted parts. `position` is clamped to the entry count.
    pub(crate) fn from_parts(
        entries: Vec<EditItem>,
        position: usize,
        max_size: Option<usize>,
    ) -> Self {
        let position = position.min(entries.len());
        let mut history = Self {
            entries,
            position,
            max_size,
        };
        history.trim();
        history
    }

    fn trim(&mut self) {
        let Some(max) = self.max_size else {
            return;
        };
        if self.entries.len() <= max {
            return;
        }
        let excess = self.entries.len() - max;
        self.entries.drain(..excess);
        self.position = self.position.saturating_sub(excess);
        trace!(evicted = excess, len = self.entries.len(), "history trimmed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(n: usize) -> EditItem {
        EditItem::new(n, "", n.to_string())
    }

    #[test]
    fn test_add_and_walk() {
        let mut history = EditHistory::default();
        history.add(item(0));
        history.add(item(1));

        assert!(history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.get_previous(), Some(item(1)));
        assert_eq!(history.get_previous(), Some(item(0)));
        assert_eq!(history.get_previous(), None);
        assert_eq!(history.position(), 0);

        assert_eq!(history.get_next(), Some(item(0)));
        assert_eq!(history.get_next(), Some(item(1)));
        assert_eq!(history.get_next(), None);
    }

    #[test]
    fn test_add_truncates_redo_tail() {
        let mut history = EditHistory::default();
        for n in 0..3 {
            history.add(item(n));
        }
        history.get_previous();
        history.get_previous();
        history.add(item(9));

        assert!(!history.can_redo());
        assert_eq!(history.entries(), &[item(0), item(9)]);
        assert_eq!(history.position(), 2);
    }

    #[test]
    fn test_bounded_history_evicts_oldest() {
        let mut history = EditHistory::new(Some(2));
        for n in 0..5 {
            history.add(item(n));
        }
        assert_eq!(history.len(), 2);
        assert_eq!(history.get_previous(), Some(item(4)));
        assert_eq!(history.get_previous(), Some(item(3)));
        assert_eq!(history.get_previous(), None);
    }

    #[test]
    fn test_shrinking_bound_adjusts_position() {
        let mut history = EditHistory::default();
        for n in 0..4 {
            history.add(item(n));
        }
        history.get_previous();
        history.get_previous();
        // position 2 of 4; dropping two oldest leaves position 0.
        history.set_max_history_size(Some(2));
        assert_eq!(history.entries(), &[item(2), item(3)]);
        assert_eq!(history.position(), 0);
        assert!(!history.can_undo());
        assert!(history.can_redo());
    }

    #[test]
    fn test_zero_bound_keeps_nothing() {
        let mut history = EditHistory::new(Some(0));
        history.add(item(0));
        assert!(history.is_empty());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_clear() {
        let mut history = EditHistory::default();
        history.add(item(0));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.position(), 0);
    }
}
