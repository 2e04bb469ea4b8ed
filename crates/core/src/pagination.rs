//! Page arithmetic for list screens.

/// Number of tickets shown per history page.
pub const HISTORY_PAGE_SIZE: i64 = 5;

/// Upper bound on open tickets listed in the operator panel.
pub const ADMIN_PANEL_LIMIT: i64 = 20;

/// A window into an ordered list of `total` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Zero-based page index.
    pub index: u32,
    pub size: i64,
    pub total: i64,
}

impl Page {
    pub fn new(index: u32, size: i64, total: i64) -> Self {
        Self {
            index,
            size: size.max(1),
            total: total.max(0),
        }
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> i64 {
        i64::from(self.index) * self.size
    }

    /// Total number of pages; an empty list still has one (empty) page.
    pub fn page_count(&self) -> i64 {
        ((self.total + self.size - 1) / self.size).max(1)
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self) -> bool {
        self.offset() + self.size < self.total
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
