//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Default upper bound on children produced by one carve request.
pub const DEFAULT_MAX_CARVE_COUNT: u32 = 4096;

/// Default upper bound on blocks returned by one free-space listing.
pub const DEFAULT_MAX_FREE_BLOCKS: u32 = 4096;

/// Default upper bound on a listing page.
pub const DEFAULT_MAX_PAGE_LIMIT: u32 = 200;

/// Limits applied by [`Ipam`](crate::Ipam) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Largest `count` accepted by a carve request.
    pub max_carve_count: u32,
    /// Largest number of blocks a free-space listing returns.
    pub max_free_blocks: u32,
    /// Largest `limit` accepted by listings.
    pub max_page_limit: u32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            max_carve_count: DEFAULT_MAX_CARVE_COUNT,
            max_free_blocks: DEFAULT_MAX_FREE_BLOCKS,
            max_page_limit: DEFAULT_MAX_PAGE_LIMIT,
        }
    }
}
