//! Listing pagination.

use serde::{Deserialize, Serialize};

use crate::error::{IpamError, IpamResult};

/// Default page size.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Requested window of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
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
    pub const fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Cut one page out of `items`, which arrive oldest first and are
    /// returned newest first.
    pub(crate) fn apply<T>(self, mut items: Vec<T>, max_limit: u32) -> IpamResult<Paged<T>> {
        if self.limit == 0 || self.limit > max_limit {
            return Err(IpamError::validation(format!(
                "limit {} must be between 1 and {max_limit}",
                self.limit
            )));
        }
        let total = items.len();
        items.reverse();
        let items = items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect();
        Ok(Paged {
            items,
            total,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    /// Matching records across all pages.
    pub total: usize,
    pub limit: u32,
    pub offset: u32,
}
