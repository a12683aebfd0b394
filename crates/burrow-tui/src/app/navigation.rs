//! Cursor and scroll handling for list views.

use super::constants::{CHROME_ROWS, MAX_VIEWPORT_ROWS, MIN_VIEWPORT_ROWS};

/// Trait for types that support list-style navigation.
pub trait ListNavigator {
    /// Get the currently selected index.
    fn selected(&self) -> usize;

    /// Set the selected index.
    fn set_selected(&mut self, index: usize);

    /// Get the maximum valid index (item count - 1, or 0 if empty).
    fn max_index(&self) -> usize;

    /// Rows moved by a page step.
    fn page_size(&self) -> usize;

    fn move_up(&mut self, count: usize) {
        let current = self.selected();
        self.set_selected(current.saturating_sub(count));
    }

    fn move_down(&mut self, count: usize) {
        let current = self.selected();
        let max = self.max_index();
        self.set_selected((current + count).min(max));
    }

    fn page_up(&mut self) {
        self.move_up(self.page_size());
    }

    fn page_down(&mut self) {
        self.move_down(self.page_size());
    }

    fn jump_to_top(&mut self) {
        self.set_selected(0);
    }

    fn jump_to_bottom(&mut self) {
        self.set_selected(self.max_index());
    }
}

/// Cursor plus the index of the first visible row.
///
/// The cursor always stays inside `top..top + rows`. Scrolling only happens
/// once the cursor moves past either edge of the visible window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    rows: usize,
    top: usize,
    cursor: usize,
    len: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(MIN_VIEWPORT_ROWS)
    }
}

impl Viewport {
    pub fn new(rows: usize) -> Self {
        Self {
            rows: rows.clamp(MIN_VIEWPORT_ROWS, MAX_VIEWPORT_ROWS),
            top: 0,
            cursor: 0,
            len: 0,
        }
    }

    /// Visible rows for a terminal of the given height.
    pub fn rows_for_height(height: u16) -> usize {
        (height as usize)
            .saturating_sub(CHROME_ROWS)
            .clamp(MIN_VIEWPORT_ROWS, MAX_VIEWPORT_ROWS)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Restore a saved position, e.g. after navigating back.
    pub fn restore(&mut self, top: usize, cursor: usize) {
        self.top = top;
        self.cursor = cursor;
        self.clamp();
    }

    /// Change the number of visible rows, keeping the cursor visible.
    pub fn set_rows(&mut self, rows: usize) {
        self.rows = rows.clamp(MIN_VIEWPORT_ROWS, MAX_VIEWPORT_ROWS);
        self.clamp();
    }

    /// Change the item count, keeping cursor and top in range.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        self.clamp();
    }

    /// Index range of the rows currently on screen.
    pub fn visible_range(&self) -> std::ops::Range<usize> {
        self.top..(self.top + self.rows).min(self.len)
    }

    /// Current page and page count, both 1-based.
    pub fn page(&self) -> (usize, usize) {
        let pages = self.len.div_ceil(self.rows).max(1);
        ((self.top / self.rows) + 1, pages)
    }

    fn clamp(&mut self) {
        if self.len == 0 {
            self.cursor = 0;
            self.top = 0;
            return;
        }
        self.cursor = self.cursor.min(self.len - 1);
        if self.cursor < self.top {
            self.top = self.cursor;
        } else if self.cursor >= self.top + self.rows {
            self.top = self.cursor + 1 - self.rows;
        }
        self.top = self.top.min(self.len.saturating_sub(self.rows));
    }
}

impl ListNavigator for Viewport {
    fn selected(&self) -> usize {
        self.cursor
    }

    fn set_selected(&mut self, index: usize) {
        self.cursor = index;
        self.clamp();
    }

    fn max_index(&self) -> usize {
        self.len.saturating_sub(1)
    }

    fn page_size(&self) -> usize {
        self.rows
    }
}
