use serde::{Deserialize, Serialize};

/// Hard upper bound on rows per page; larger requests fall back to the default.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Default rows per page when the caller sends nothing usable.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Pagination parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationParams {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Build params from loosely-typed request values. Invalid or missing
    /// values fall back to `page = 1`, `per_page = 100`.
    pub fn from_raw(page: Option<i64>, per_page: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p as u32,
            _ => 1,
        };
        let per_page = match per_page {
            Some(s) if s > 0 && s <= MAX_PAGE_SIZE as i64 => s as u32,
            _ => DEFAULT_PAGE_SIZE,
        };
        Self { page, per_page }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }
}

/// Paginated result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, params: PaginationParams) -> Self {
        // Hand-built params can carry per_page = 0; never divide by it.
        let per_page = params.per_page.max(1);
        let total_pages = total.div_ceil(per_page as u64) as u32;
        Self {
            items,
            total,
            page: params.page,
            per_page,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_params_fall_back_to_defaults() {
        assert_eq!(PaginationParams::from_raw(None, None), PaginationParams::new(1, 100));
        assert_eq!(PaginationParams::from_raw(Some(0), Some(0)), PaginationParams::new(1, 100));
        assert_eq!(PaginationParams::from_raw(Some(-3), Some(-1)), PaginationParams::new(1, 100));
        assert_eq!(PaginationParams::from_raw(Some(2), Some(1001)), PaginationParams::new(2, 100));
        assert_eq!(PaginationParams::from_raw(Some(4), Some(1000)), PaginationParams::new(4, 1000));
    }

    #[test]
    fn test_offset_math() {
        assert_eq!(PaginationParams::new(1, 100).offset(), 0);
        assert_eq!(PaginationParams::new(3, 100).offset(), 200);
        assert_eq!(PaginationParams::new(26, 100).offset(), 2500);
    }

    #[test]
    fn test_zero_per_page_is_clamped_not_divided_by() {
        let result = PaginatedResult::<i32>::new(vec![], 10, PaginationParams::new(1, 0));
        assert_eq!(result.per_page, 1);
        assert_eq!(result.total_pages, 10);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let params = PaginationParams::new(1, 100);
        assert_eq!(PaginatedResult::<i32>::new(vec![], 2500, params).total_pages, 25);
        assert_eq!(PaginatedResult::<i32>::new(vec![], 2501, params).total_pages, 26);
        assert_eq!(PaginatedResult::<i32>::new(vec![], 0, params).total_pages, 0);
        assert_eq!(PaginatedResult::<i32>::new(vec![], 1, params).total_pages, 1);
    }
}
