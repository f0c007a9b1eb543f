//! Pagination over an ordered episode sequence.
//!
//! Page numbers are 1-based and clamped rather than rejected. When the page
//! size changes, [`reposition_on_resize`] picks the page that still shows the
//! first item the reader was looking at.

use crate::error::AppError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of items per page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSize {
    /// At most this many items (never zero).
    Limited(usize),
    /// Everything on a single page.
    Unlimited,
}

impl PageSize {
    /// A limited page size; zero is raised to one.
    pub fn limited(size: usize) -> Self {
        PageSize::Limited(size.max(1))
    }

    /// The numeric size, or `None` for [`PageSize::Unlimited`].
    pub fn as_limit(&self) -> Option<usize> {
        match self {
            PageSize::Limited(n) => Some((*n).max(1)),
            PageSize::Unlimited => None,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::Limited(10)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::Limited(n) => write!(f, "{}", n),
            PageSize::Unlimited => write!(f, "unlimited"),
        }
    }
}

impl FromStr for PageSize {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unlimited" | "all" => Ok(PageSize::Unlimited),
            other => match other.parse::<usize>() {
                Ok(n) if n > 0 => Ok(PageSize::Limited(n)),
                _ => Err(AppError::InvalidInput(format!(
                    "Page size must be a positive number or 'unlimited', got '{}'",
                    s
                ))),
            },
        }
    }
}

impl Serialize for PageSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageSize::Limited(n) => serializer.serialize_u64(*n as u64),
            PageSize::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

/// Pagination metadata for one window.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PaginationWindow {
    pub current_page: usize,
    pub page_size: PageSize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
    /// 1-based, inclusive. Zero when there are no items.
    pub start_index: usize,
    /// 1-based, inclusive. Zero when there are no items.
    pub end_index: usize,
    /// Set by episode-number search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searched_episode_number: Option<u32>,
    pub is_highlighted: bool,
}

impl PaginationWindow {
    /// Compute the window metadata for `page` over `total_items`.
    pub fn compute(total_items: usize, page: usize, page_size: PageSize) -> Self {
        let total_pages = match page_size.as_limit() {
            Some(size) => total_items.div_ceil(size).max(1),
            None => 1,
        };
        let current_page = page.clamp(1, total_pages);

        let (start_index, end_index) = if total_items == 0 {
            (0, 0)
        } else {
            match page_size.as_limit() {
                Some(size) => {
                    let offset = (current_page - 1) * size;
                    (offset + 1, (offset + size).min(total_items))
                }
                None => (1, total_items),
            }
        };

        Self {
            current_page,
            page_size,
            total_items,
            total_pages,
            has_next: current_page < total_pages,
            has_previous: current_page > 1,
            start_index,
            end_index,
            searched_episode_number: None,
            is_highlighted: false,
        }
    }

    /// 0-based index of the first item on this page.
    pub fn offset(&self) -> usize {
        match self.page_size.as_limit() {
            Some(size) => (self.current_page - 1) * size,
            None => 0,
        }
    }

    /// The window for `new_size` that keeps this page's first item visible.
    pub fn resized(&self, new_size: PageSize) -> Self {
        let page = reposition_on_resize(self.offset(), new_size);
        Self::compute(self.total_items, page, new_size)
    }
}

/// A slice of items plus its pagination metadata.
#[derive(Debug, PartialEq)]
pub struct Window<'a, T> {
    pub items: &'a [T],
    pub pagination: PaginationWindow,
}

/// Cut the page `page` out of `items`.
///
/// # Examples
///
/// ```
/// use podcast_catalog::pagination::{window, PageSize};
///
/// let items: Vec<u32> = (1..=25).collect();
/// let w = window(&items, 3, PageSize::Limited(10));
/// assert_eq!(w.items, &[21, 22, 23, 24, 25]);
/// assert!(!w.pagination.has_next);
/// ```
pub fn window<T>(items: &[T], page: usize, page_size: PageSize) -> Window<'_, T> {
    let pagination = PaginationWindow::compute(items.len(), page, page_size);
    let slice = if items.is_empty() {
        &items[..0]
    } else {
        &items[pagination.start_index - 1..pagination.end_index]
    };
    Window {
        items: slice,
        pagination,
    }
}

/// Page to show after a page-size change.
///
/// `old_start_index` is the 0-based index of the first item on the old page.
pub fn reposition_on_resize(old_start_index: usize, new_page_size: PageSize) -> usize {
    match new_page_size.as_limit() {
        Some(size) => old_start_index / size + 1,
        None => 1,
    }
}
