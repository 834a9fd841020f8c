//! Splitting very large documents into editable pages.
//!
//! A document longer than [`MAX_SINGLE_PAGE_CHARS`] is cut into pages of at least
//! [`CHARS_PER_PAGE`] characters, each extended to the next line break. The break itself is
//! the separator and belongs to neither page, so joining the pages with `"\n"` rebuilds the
//! document.

use tracing::debug;

/// Minimum page length in characters.
pub const CHARS_PER_PAGE: usize = 15_000;

/// Documents up to this length are never paged.
pub const MAX_SINGLE_PAGE_CHARS: usize = 30_000;

/// Pages of a document plus the real-line offset of each page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSystem {
    pages: Vec<String>,
    starting_lines: Vec<usize>,
    current: usize,
}

impl PageSystem {
    /// Split `text` into pages (or keep it whole when paging is disabled or not needed).
    pub fn new(text: &str, enabled: bool) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let pages = if enabled && chars.len() > MAX_SINGLE_PAGE_CHARS {
            split_pages(&chars)
        } else {
            vec![text.to_string()]
        };
        debug!(pages = pages.len(), "page system built");

        let mut system = Self {
            starting_lines: vec![0; pages.len()],
            pages,
            current: 0,
        };
        system.compute_starting_lines();
        system
    }

    /// Real lines before the current page.
    pub fn starting_line(&self) -> usize {
        self.starting_lines[self.current]
    }

    /// Index of the current page.
    pub fn current_page(&self) -> usize {
        self.current
    }

    /// Index of the last page.
    pub fn max_page(&self) -> usize {
        self.pages.len() - 1
    }

    /// Text of the current page.
    pub fn current_page_text(&self) -> &str {
        &self.pages[self.current]
    }

    /// Store edits made to the current page.
    pub fn save_page(&mut self, text: impl Into<String>) {
        self.pages[self.current] = text.into();
    }

    /// A later page exists.
    pub fn can_read_next_page(&self) -> bool {
        self.current < self.max_page()
    }

    /// An earlier page exists.
    pub fn can_read_prev_page(&self) -> bool {
        self.current > 0
    }

    /// Move to the next page, if any. Returns the new page index.
    pub fn next_page(&mut self) -> usize {
        if self.can_read_next_page() {
            self.go_to_page(self.current + 1);
        }
        self.current
    }

    /// Move to the previous page, if any. Returns the new page index.
    pub fn prev_page(&mut self) -> usize {
        if self.can_read_prev_page() {
            self.go_to_page(self.current - 1);
        }
        self.current
    }

    /// Jump to `page` (clamped).
    ///
    /// Leaving a page forward re-bases later pages by the change in line count of the page
    /// being left, so gutter numbers stay right after edits.
    pub fn go_to_page(&mut self, page: usize) -> usize {
        let page = page.min(self.max_page());
        if page > self.current {
            let now = line_count(&self.pages[self.current]);
            let before = self.starting_lines[self.current + 1] - self.starting_lines[self.current];
            if now != before {
                for start in &mut self.starting_lines[self.current + 1..] {
                    *start = (*start + now).saturating_sub(before);
                }
            }
        }
        self.current = page;
        page
    }

    /// The whole document, with `current_text` as the current page's content.
    pub fn all_text(&mut self, current_text: &str) -> String {
        self.save_page(current_text);
        self.pages.join("\n")
    }

    fn compute_starting_lines(&mut self) {
        for i in 1..self.pages.len() {
            self.starting_lines[i] = self.starting_lines[i - 1] + line_count(&self.pages[i - 1]);
        }
    }
}

fn split_pages(chars: &[char]) -> Vec<String> {
    let mut pages = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let min_end = (start + CHARS_PER_PAGE).min(chars.len());
        // A page without a later line break runs to the end of the text.
        let end = chars[min_end..]
            .iter()
            .position(|&c| c == '\n')
            .map_or(chars.len(), |i| min_end + i);
        pages.push(chars[start..end].iter().collect());
        start = end + 1;
    }
    // The last break was a separator: an empty final page keeps it on join.
    if start == chars.len() {
        pages.push(String::new());
    }
    pages
}

// Lines on a page, counting the one ended by the page separator.
fn line_count(text: &str) -> usize {
    text.matches('\n').count() + 1
}
