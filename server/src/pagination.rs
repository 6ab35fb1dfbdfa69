//! Page-number pagination for post listings.
//!
//! Out-of-range page numbers clamp to the last page and unparsable ones fall
//! back to the first, so a stale `?page=` link always lands somewhere.

use serde::Serialize;

/// Posts shown per page on index, group and profile listings.
pub const POSTS_PER_PAGE: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub number: i64,
    pub num_pages: i64,
    pub per_page: i64,
    pub count: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PageInfo {
    /// Resolve a raw `?page=` value against a total row count.
    #[must_use]
    pub fn resolve(raw: Option<&str>, count: i64, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        let count = count.max(0);
        let num_pages = ((count + per_page - 1) / per_page).max(1);
        let requested = raw
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(1);
        let number = requested.clamp(1, num_pages);

        Self {
            number,
            num_pages,
            per_page,
            count,
            has_previous: number > 1,
            has_next: number < num_pages,
        }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }
}

/// One page of results plus its position.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: PageInfo,
}
