use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: u32 = 10;

/// Common `page`/`per_page` query parameters for list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, 100)
    }

    pub fn limit(&self) -> i64 {
        self.per_page() as i64
    }

    pub fn offset(&self) -> i64 {
        ((self.page() - 1) as i64) * self.per_page() as i64
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self { page: None, per_page: None }
    }
}

/// One page of results with the usual bookkeeping fields.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub last_page: u32,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, params: PageParams) -> Self {
        let per_page = params.per_page();
        let last_page = if total <= 0 {
            1
        } else {
            ((total as u64).div_ceil(per_page as u64)) as u32
        };
        Self {
            data,
            total,
            page: params.page(),
            per_page,
            last_page,
        }
    }

    /// Paginate an already-collected list (used where two sources are merged
    /// before paging).
    pub fn slice(all: Vec<T>, params: PageParams) -> Self {
        let total = all.len() as i64;
        let data: Vec<T> = all
            .into_iter()
            .skip(params.offset() as usize)
            .take(params.limit() as usize)
            .collect();
        Page::new(data, total, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: u32, per_page: u32) -> PageParams {
        PageParams { page: Some(page), per_page: Some(per_page) }
    }

    #[test]
    fn defaults_and_clamping() {
        let p = PageParams::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.per_page(), DEFAULT_PER_PAGE);
        assert_eq!(p.offset(), 0);

        let p = params(0, 1000);
        assert_eq!(p.page(), 1);
        assert_eq!(p.per_page(), 100);
    }

    #[test]
    fn last_page_rounds_up() {
        let page = Page::new(vec![1, 2, 3], 21, params(1, 10));
        assert_eq!(page.last_page, 3);

        let page: Page<i32> = Page::new(vec![], 0, params(1, 10));
        assert_eq!(page.last_page, 1);
    }

    #[test]
    fn slice_takes_the_requested_window() {
        let all: Vec<i32> = (1..=25).collect();
        let page = Page::slice(all, params(3, 10));
        assert_eq!(page.data, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
        assert_eq!(page.last_page, 3);
    }
}
