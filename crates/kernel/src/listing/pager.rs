//! Page/limit normalization and page metadata.

use super::types::{DEFAULT_LIMIT, DEFAULT_PAGE, PageInfo};

/// Rows to skip and rows to return for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

/// A normalized page request. `page` and `limit` are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: u32,
    limit: u32,
}

impl Pager {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Parse raw `page` and `limit` values.
    ///
    /// Missing, non-numeric and non-positive values fall back to the defaults.
    /// A limit above `max_limit` is capped.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>, max_limit: u32) -> Self {
        let page = parse_positive(page).unwrap_or(DEFAULT_PAGE);
        let mut limit = parse_positive(limit).unwrap_or(DEFAULT_LIMIT);

        if limit > max_limit {
            tracing::warn!(
                requested = limit,
                capped = max_limit,
                "list limit exceeds maximum, capping"
            );
            limit = max_limit;
        }

        Self::new(page, limit)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Window {
        let limit = u64::from(self.limit);
        Window {
            offset: u64::from(self.page.saturating_sub(1)) * limit,
            limit,
        }
    }

    /// Page metadata for a result set of `total` rows.
    pub fn page_info(&self, total: u64) -> PageInfo {
        let total_pages = total.div_ceil(u64::from(self.limit));
        PageInfo {
            current_page: self.page,
            limit: self.limit,
            total_items: total,
            total_pages,
            has_next_page: u64::from(self.page) < total_pages,
        }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    let value: i64 = raw?.trim().parse().ok()?;
    if value <= 0 {
        return None;
    }
    Some(u32::try_from(value).unwrap_or(u32::MAX))
}
