//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// Page numbers are 1-indexed.
    #[error("page must be at least 1, got {0}")]
    InvalidPage(u32),

    /// Page size outside the accepted window.
    #[error("limit must be between 1 and {max}, got {limit}")]
    InvalidLimit {
        /// Requested page size.
        limit: u32,
        /// Largest accepted page size.
        max: u32,
    },
}

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Number of items per page.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    PageRequest::DEFAULT_PAGE
}

fn default_limit() -> u32 {
    PageRequest::DEFAULT_LIMIT
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageRequest {
    /// First page.
    pub const DEFAULT_PAGE: u32 = 1;
    /// Default page size.
    pub const DEFAULT_LIMIT: u32 = 10;
    /// Largest page size a caller may request.
    pub const MAX_LIMIT: u32 = 100;

    /// Builds a validated page request, filling defaults for missing values.
    ///
    /// # Errors
    ///
    /// Returns an error if `page` is 0 or `limit` is outside `1..=MAX_LIMIT`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, PaginationError> {
        let request = Self {
            page: page.unwrap_or(Self::DEFAULT_PAGE),
            limit: limit.unwrap_or(Self::DEFAULT_LIMIT),
        };
        request.validate()?;
        Ok(request)
    }

    /// Checks the page and limit bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is out of range.
    pub fn validate(&self) -> Result<(), PaginationError> {
        if self.page == 0 {
            return Err(PaginationError::InvalidPage(self.page));
        }
        if self.limit == 0 || self.limit > Self::MAX_LIMIT {
            return Err(PaginationError::InvalidLimit {
                limit: self.limit,
                max: Self::MAX_LIMIT,
            });
        }
        Ok(())
    }

    /// Calculates the offset of the first item on this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Returns the page size as a query limit.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.limit)
    }
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub limit: u32,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl PageMeta {
    /// Computes metadata for `total` items split by `request`.
    #[must_use]
    pub fn new(request: PageRequest, total: u64) -> Self {
        let total_pages = if request.limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(request.limit))
        };

        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages,
        }
    }
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub pagination: PageMeta,
}

impl<T> PageResponse<T> {
    /// Creates a new paginated response.
    #[must_use]
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            data,
            pagination: PageMeta::new(request, total),
        }
    }

    /// Maps the items while keeping the pagination metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
