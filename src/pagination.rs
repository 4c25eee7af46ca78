//! Fixed-size pagination over an ordered list.

use serde::Serialize;

pub const PAGE_SIZE: usize = 9;

/// One page of a list, borrowed from the full item slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page_index: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// State of the prev/next controls. Buttons at a boundary are disabled,
/// never hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationControls {
    pub page_index: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub prev_disabled: bool,
    pub next_disabled: bool,
}

impl PaginationControls {
    pub fn summary(&self) -> String {
        format!(
            "Page {} of {} • {} problem(s)",
            self.page_index, self.total_pages, self.total_items
        )
    }
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size.max(1))
}

/// Clamps `page_index` into `[1, max(total_pages, 1)]`.
pub fn clamp_page_index(page_index: usize, total_pages: usize) -> usize {
    page_index.clamp(1, total_pages.max(1))
}

pub fn paginate<T>(items: &[T], page_index: usize, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(items.len(), page_size);
    let page_index = clamp_page_index(page_index, total_pages);
    let start = ((page_index - 1) * page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());

    Page {
        items: &items[start..end],
        page_index,
        total_pages,
        total_items: items.len(),
    }
}

impl<T> Page<'_, T> {
    /// `None` when everything fits on one page (or there is nothing to show).
    pub fn controls(&self) -> Option<PaginationControls> {
        if self.total_pages <= 1 {
            return None;
        }
        Some(PaginationControls {
            page_index: self.page_index,
            total_pages: self.total_pages,
            total_items: self.total_items,
            prev_disabled: self.page_index <= 1,
            next_disabled: self.page_index >= self.total_pages,
        })
    }
}

/// Ordered items plus the current page position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState<T> {
    items: Vec<T>,
    page_index: usize,
    page_size: usize,
}

impl<T> Default for PageState<T> {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl<T> PageState<T> {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            page_index: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.items.len(), self.page_size)
    }

    /// New result set; always starts again from page 1.
    pub fn replace_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.page_index = 1;
    }

    pub fn reset_page(&mut self) {
        self.page_index = 1;
    }

    /// Moves by `delta` pages, clamped to the available range. Returns
    /// whether the page changed.
    pub fn step(&mut self, delta: isize) -> bool {
        let target = self.page_index.saturating_add_signed(delta);
        let clamped = clamp_page_index(target, self.total_pages());
        let changed = clamped != self.page_index;
        self.page_index = clamped;
        changed
    }

    pub fn next(&mut self) -> bool {
        self.step(1)
    }

    pub fn prev(&mut self) -> bool {
        self.step(-1)
    }

    pub fn current(&self) -> Page<'_, T> {
        paginate(&self.items, self.page_index, self.page_size)
    }
}
