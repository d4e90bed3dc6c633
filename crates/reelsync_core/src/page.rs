use std::ops::Range;

/// Cache key for one page of a paginated listing. Page numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub page: usize,
    pub page_size: usize,
}

impl PageKey {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            page_size: 1,
            total: 0,
            total_pages: 0,
        }
    }
}

/// Half-open index range `[(k-1)*size, min(k*size, total))` covered by page `k`.
/// Pages past the end yield an empty range anchored at `total`.
pub fn page_bounds(total: usize, key: PageKey) -> Range<usize> {
    let start = key.page.saturating_sub(1).saturating_mul(key.page_size).min(total);
    let end = key.page.saturating_mul(key.page_size).min(total);
    start..end
}

pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

pub fn paginate<T: Clone>(items: &[T], key: PageKey) -> Page<T> {
    let range = page_bounds(items.len(), key);
    Page {
        items: items[range].to_vec(),
        page: key.page,
        page_size: key.page_size,
        total: items.len(),
        total_pages: total_pages(items.len(), key.page_size),
    }
}
