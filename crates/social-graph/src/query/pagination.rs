use serde::{Deserialize, Serialize};

use crate::data::RepositoryError;

pub const DEFAULT_LIMIT: usize = 50;
pub const DEFAULT_PAGE: usize = 1;

/// Page size and 1-based page number of a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: usize,
    pub page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            page: DEFAULT_PAGE,
        }
    }
}

impl Pagination {
    pub fn new(limit: usize, page: usize) -> Self {
        Self { limit, page }
    }

    /// Half-open offset window of this page.
    pub fn range(&self) -> Result<(usize, usize), RepositoryError> {
        pagination_range(self.limit, self.page)
    }
}

/// Offset window `[start, end)` for a 1-based page of `limit` rows.
pub fn pagination_range(limit: usize, page: usize) -> Result<(usize, usize), RepositoryError> {
    if limit < 1 {
        return Err(RepositoryError::BadRequest("limit must be greater than or equal to 1".into()));
    }
    if page < 1 {
        return Err(RepositoryError::BadRequest("page must be greater than or equal to 1".into()));
    }
    let end = page
        .checked_mul(limit)
        .ok_or_else(|| RepositoryError::BadRequest("page is out of range".into()))?;
    Ok((end - limit, end))
}
