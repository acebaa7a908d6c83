//! Pagination types shared by the record store and the search index.

use serde::{Deserialize, Serialize};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Pagination request (0-based page index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pageable {
    pub page: u64,
    pub size: u64,
}

impl Default for Pageable {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pageable {
    /// Build a page request, falling back to `default_size` and capping at [`MAX_PAGE_SIZE`].
    pub fn new(page: Option<u64>, size: Option<u64>, default_size: u64) -> Self {
        Self {
            page: page.unwrap_or(0),
            size: size.unwrap_or(default_size).min(MAX_PAGE_SIZE),
        }
    }

    /// Shorthand for `Pageable::new(Some(page), Some(size), DEFAULT_PAGE_SIZE)`.
    pub fn of(page: u64, size: u64) -> Self {
        Self::new(Some(page), Some(size), DEFAULT_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }

    /// Cut one page out of a fully materialized, already ordered result set.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len() as u64;
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let size = usize::try_from(self.size).unwrap_or(usize::MAX);
        let content = items.into_iter().skip(offset).take(size).collect();
        Page::new(content, self, total)
    }
}

/// A page of results with pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, pageable: &Pageable, total_elements: u64) -> Self {
        let total_pages = if pageable.size == 0 {
            0
        } else {
            total_elements.div_ceil(pageable.size)
        };
        Self {
            content,
            page: pageable.page,
            size: pageable.size,
            total_elements,
            total_pages,
        }
    }

    /// Whether a page after this one exists.
    pub fn has_next(&self) -> bool {
        self.page.saturating_add(1) < self.total_pages
    }
}
