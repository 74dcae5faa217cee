use serde::Serialize;

/// Items returned when the caller does not ask for a page size.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 50;
/// Largest page size a caller may request.
pub const MAX_ITEMS_PER_PAGE: usize = 100;

/// Page request taken from the `page` and `limit` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    /// Clamps raw query values: `page` is at least 1 and `limit` stays
    /// within `1..=MAX_ITEMS_PER_PAGE`.
    pub fn new(page: Option<usize>, limit: Option<usize>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(DEFAULT_ITEMS_PER_PAGE)
                .clamp(1, MAX_ITEMS_PER_PAGE),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub page: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

impl PageInfo {
    pub fn new(total: usize, request: PageRequest) -> Self {
        let limit = request.limit.max(1);
        let offset = request.offset();
        Self {
            total,
            limit,
            offset,
            page: offset / limit + 1,
            total_pages: total.div_ceil(limit),
            has_more: offset + limit < total,
        }
    }
}
