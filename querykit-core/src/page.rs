use serde::Serialize;

use crate::pagination::NormalizedPagination;

/// A page of results with pagination metadata.
///
/// `total` is the number of rows the executor matched before the page slice
/// was taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, pagination: &NormalizedPagination, total: u64) -> Self {
        Self {
            data,
            total,
            page: pagination.page,
            limit: pagination.limit,
        }
    }

    /// Number of pages of `limit` rows needed to hold `total` rows.
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            0
        } else {
            self.total.div_ceil(self.limit)
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Take the contiguous `[offset, offset + limit)` window out of `rows`.
///
/// Out-of-range windows yield an empty vector.
pub fn slice_page<R>(rows: Vec<R>, pagination: &NormalizedPagination) -> Vec<R> {
    let offset = usize::try_from(pagination.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(pagination.limit).unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit).collect()
}
