//! Pagination envelope for list endpoints.

use serde::Serialize;

/// Normalized page/limit query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    /// Builds parameters from optional query values, defaulting to page 1
    /// with 10 records and clamping the limit to at most 100.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(10).clamp(1, 100),
        }
    }

    /// Number of records to skip.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pointer to an adjacent page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub page: i64,
    pub limit: i64,
}

/// One page of results with the total count and adjacent-page pointers.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub total: i64,
    pub result: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
}

impl<T> Page<T> {
    /// Assembles a page from a fetched slice and the total record count.
    pub fn assemble(result: Vec<T>, total: i64, params: PageParams) -> Self {
        let offset = params.offset();
        let previous = (offset > 0).then(|| PageRef {
            page: params.page - 1,
            limit: params.limit,
        });
        let next = (offset + (result.len() as i64) < total).then(|| PageRef {
            page: params.page + 1,
            limit: params.limit,
        });
        Self {
            total,
            result,
            previous,
            next,
        }
    }

    /// Converts the page's records, keeping the envelope.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total: self.total,
            result: self.result.into_iter().map(f).collect(),
            previous: self.previous,
            next: self.next,
        }
    }
}
