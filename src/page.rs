//! Pagination helpers.
//!
//! [`Page`] is a fluent limit/offset pair. It is not validated when built or
//! moved; the check runs when the page is applied to an operation, so a page
//! can pass through intermediate states (e.g. `limit == 0`) in a chain.
//!
//! # Example
//!
//! ```
//! use collection_query::Page;
//!
//! let page = Page::new().with_limit(20);
//! assert_eq!(page.offset(), 0);
//! let page = page.next();
//! assert_eq!((page.offset(), page.number()), (20, 1));
//! ```

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PAGE_LIMIT;
use crate::error::{QueryError, Result};

/// Limit/offset pagination cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Page {
    limit: usize,
    offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The following page. Saturates at `usize::MAX` instead of wrapping.
    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
        }
    }

    /// The preceding page, clamped at offset 0.
    #[must_use]
    pub fn prev(&self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_sub(self.limit),
        }
    }

    /// Zero-based page number; 0 when `limit == 0`.
    pub fn number(&self) -> usize {
        self.offset.checked_div(self.limit).unwrap_or(0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(QueryError::invalid_value("limit", "must be greater than 0"));
        }
        Ok(())
    }
}

/// `{"limit": N, "offset": N}` object of a search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

impl SearchPage {
    pub fn validate(&self) -> Result<()> {
        if self.limit == Some(0) {
            return Err(QueryError::invalid_value("limit", "must be greater than 0"));
        }
        Ok(())
    }
}

impl From<Page> for SearchPage {
    fn from(page: Page) -> Self {
        Self {
            limit: Some(page.limit),
            offset: page.offset,
        }
    }
}
