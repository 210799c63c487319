//! Page/limit handling shared by the list queries.

/// Default page number when the client sends none or an invalid value.
const DEFAULT_PAGE: i64 = 1;

/// Default page size when the client sends none or an invalid value.
const DEFAULT_LIMIT: i64 = 10;

/// A resolved (page, limit) pair.
///
/// Built from raw query parameters; non-positive or missing values fall back
/// to the defaults rather than erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    limit: i64,
}

impl Pagination {
    /// Resolve raw query parameters to a usable pagination window.
    #[must_use]
    pub fn from_params(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p > 0 => p,
            _ => DEFAULT_PAGE,
        };
        let limit = match limit {
            Some(l) if l > 0 => l,
            _ => DEFAULT_LIMIT,
        };
        Self { page, limit }
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(self) -> i64 {
        self.page
    }

    /// Rows per page.
    #[must_use]
    pub const fn limit(self) -> i64 {
        self.limit
    }

    /// `OFFSET` value for the query.
    #[must_use]
    pub const fn offset(self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Total number of pages for a given row count.
    #[must_use]
    pub fn page_count(self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::from_params(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Pagination::from_params(None, None);
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_non_positive_values_fall_back() {
        let p = Pagination::from_params(Some(0), Some(-5));
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 10);
    }

    #[test]
    fn test_offset_for_later_pages() {
        let p = Pagination::from_params(Some(2), Some(5));
        assert_eq!(p.offset(), 5);
        let p = Pagination::from_params(Some(4), Some(25));
        assert_eq!(p.offset(), 75);
    }

    #[test]
    fn test_page_count_rounds_up() {
        let p = Pagination::from_params(Some(2), Some(5));
        // 12 rows at 5 per page -> 3 pages
        assert_eq!(p.page_count(12), 3);
        assert_eq!(p.page_count(10), 2);
        assert_eq!(p.page_count(0), 0);
        assert_eq!(p.page_count(1), 1);
    }
}
