//! Pagination window and active-row stepping.

/// Position of the current page within a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

impl PageWindow {
    pub fn new(page: u32, size: u32, total: u64) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
            total,
        }
    }

    /// Number of pages; an empty result still has one (empty) page.
    pub fn page_count(&self) -> u32 {
        let pages = self.total.div_ceil(self.size as u64).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Index of the first row of this page in the full result set.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.size as u64
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Same window moved onto the last existing page when past the end.
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.min(self.page_count()),
            ..*self
        }
    }

    /// 1-based inclusive row range shown on this page, `None` when empty.
    pub fn row_range(&self) -> Option<(u64, u64)> {
        let start = self.offset() + 1;
        if start > self.total {
            return None;
        }
        let end = (self.offset() + self.size as u64).min(self.total);
        Some((start, end))
    }
}

/// Tracks the active row of a page, e.g. the one open in a detail panel.
#[derive(Debug, Clone, Default)]
pub struct RowCursor {
    ids: Vec<String>,
    active: Option<usize>,
}

impl RowCursor {
    pub fn new(ids: Vec<String>, active_id: Option<&str>) -> Self {
        let active = active_id.and_then(|a| ids.iter().position(|id| id == a));
        Self { ids, active }
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.map(|i| self.ids[i].as_str())
    }

    pub fn has_next(&self) -> bool {
        self.active.is_some_and(|i| i + 1 < self.ids.len())
    }

    pub fn has_previous(&self) -> bool {
        self.active.is_some_and(|i| i > 0)
    }

    /// Moves the active row by `shift` and returns the new id.
    ///
    /// Moving past either end, or with no active row, leaves the cursor
    /// untouched and returns `None`.
    pub fn shift(&mut self, shift: isize) -> Option<&str> {
        let target = self.target(shift)?;
        self.active = Some(target);
        Some(self.ids[target].as_str())
    }

    /// Id `shift` rows away from the active one, without moving.
    pub fn peek(&self, shift: isize) -> Option<&str> {
        self.target(shift).map(|i| self.ids[i].as_str())
    }

    fn target(&self, shift: isize) -> Option<usize> {
        let target = self.active?.checked_add_signed(shift)?;
        (target < self.ids.len()).then_some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window() {
        let w = PageWindow::new(2, 100, 250);
        assert_eq!(w.page_count(), 3);
        assert_eq!(w.offset(), 100);
        assert!(w.has_next());
        assert!(w.has_previous());
        assert_eq!(w.row_range(), Some((101, 200)));

        let last = PageWindow::new(3, 100, 250);
        assert!(!last.has_next());
        assert_eq!(last.row_range(), Some((201, 250)));
    }

    #[test]
    fn test_page_window_empty_and_clamp() {
        let w = PageWindow::new(1, 10, 0);
        assert_eq!(w.page_count(), 1);
        assert!(!w.has_next());
        assert!(!w.has_previous());
        assert_eq!(w.row_range(), None);

        let past = PageWindow::new(9, 10, 25);
        assert_eq!(past.row_range(), None);
        assert_eq!(past.clamped().page, 3);
    }

    #[test]
    fn test_row_cursor() {
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut cursor = RowCursor::new(ids.clone(), Some("a"));
        assert!(cursor.has_next());
        assert!(!cursor.has_previous());
        assert_eq!(cursor.peek(2), Some("c"));
        assert_eq!(cursor.peek(-1), None);
        assert_eq!(cursor.active_id(), Some("a"));
        assert_eq!(cursor.shift(1), Some("b"));
        assert_eq!(cursor.shift(1), Some("c"));
        assert!(!cursor.has_next());
        assert_eq!(cursor.shift(1), None);
        assert_eq!(cursor.active_id(), Some("c"));
        assert_eq!(cursor.shift(-2), Some("a"));
        assert_eq!(cursor.shift(-1), None);

        let none = RowCursor::new(ids, Some("zzz"));
        assert!(!none.has_next());
        assert!(!none.has_previous());
        assert_eq!(none.active_id(), None);
    }
}
