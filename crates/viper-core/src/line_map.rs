//! Real-line numbering over soft-wrapped visual lines.
//!
//! Only the last visual segment of each real line carries a number in the gutter, so wrapped
//! continuations do not repeat it. Real line numbers are 1-based and offset by the starting
//! real line of the shown page.

use tracing::trace;

use crate::buffer::Document;
use crate::layout::LayoutGeometry;

/// Per-render line numbering state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineMap {
    /// `good_line[i]`: visual line `i` is the last segment of its real line.
    pub good_line: Vec<bool>,
    /// Real (1-based) line number of each visual line.
    pub real_line_of: Vec<usize>,
    /// Real lines preceding the shown text.
    pub starting_real_line: usize,
    /// Soft wrap was enabled when this map was computed.
    pub wrap: bool,
}

impl LineMap {
    /// Compute the map for the first `visual_line_count` visual lines of `layout`.
    ///
    /// An empty document still has one visual line, numbered.
    pub fn compute(
        starting_real_line: usize,
        visual_line_count: usize,
        layout: &impl LayoutGeometry,
        document: &Document,
        wrap: bool,
    ) -> Self {
        let count = visual_line_count.min(layout.visual_line_count()).max(1);
        let len = document.len_chars();
        let mut good_line = Vec::with_capacity(count);
        let mut real_line_of = Vec::with_capacity(count);

        for i in 0..count {
            let start = layout.line_start(i).min(len);
            let end = layout.line_end(i).min(len);
            let ends_with_newline = end > start && document.rope().char(end - 1) == '\n';

            good_line.push(!wrap || ends_with_newline || i + 1 == count);
            real_line_of.push(starting_real_line + 1 + document.line_of_char(start));
        }

        Self {
            good_line,
            real_line_of,
            starting_real_line,
            wrap,
        }
    }

    /// Number of visual lines covered.
    pub fn len(&self) -> usize {
        self.good_line.len()
    }

    /// Returns `true` if the map covers no lines.
    pub fn is_empty(&self) -> bool {
        self.good_line.is_empty()
    }

    /// Real line of the first visual line.
    pub fn first_real_line(&self) -> usize {
        self.real_line_of
            .first()
            .copied()
            .unwrap_or(self.starting_real_line + 1)
    }

    /// Real line of the last visual line.
    pub fn last_real_line(&self) -> usize {
        self.real_line_of
            .last()
            .copied()
            .unwrap_or(self.starting_real_line + 1)
    }

    /// First visual line showing real line `real`, or 0 if it is not covered.
    pub fn visual_line_of_real_line(&self, real: usize) -> usize {
        self.real_line_of
            .iter()
            .position(|&line| line == real)
            .unwrap_or(0)
    }

    /// `(visual_index, real_line)` pairs that get a number in the gutter.
    pub fn numbered_lines(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.real_line_of
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.wrap || self.good_line[*i])
            .map(|(i, &line)| (i, line))
    }
}

/// Cached [`LineMap`] that recomputes only when its inputs change.
#[derive(Debug, Clone, Default)]
pub struct LineMapper {
    map: LineMap,
    key: Option<(usize, usize, bool)>,
}

impl LineMapper {
    /// Create an empty mapper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute if the visual line count, starting real line or wrap flag changed, or after
    /// [`Self::invalidate`].
    pub fn update(
        &mut self,
        starting_real_line: usize,
        visual_line_count: usize,
        layout: &impl LayoutGeometry,
        document: &Document,
        wrap: bool,
    ) -> &LineMap {
        let key = (starting_real_line, visual_line_count, wrap);
        if self.key != Some(key) {
            self.map =
                LineMap::compute(starting_real_line, visual_line_count, layout, document, wrap);
            self.key = Some(key);
            trace!(starting_real_line, visual_line_count, "line map recomputed");
        }
        &self.map
    }

    /// Force the next [`Self::update`] to recompute (call after every buffer edit).
    pub fn invalidate(&mut self) {
        self.key = None;
    }

    /// Last computed map.
    pub fn map(&self) -> &LineMap {
        &self.map
    }
}

/// Visual line containing character `offset`.
pub fn line_of_offset(layout: &impl LayoutGeometry, offset: usize) -> usize {
    layout.line_of_offset(offset)
}
