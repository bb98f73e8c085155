//! Reusable argument groups.

mod allocator;
mod database;
mod log;

pub use allocator::{AllocatorArgs, DEFAULT_CARVE_COUNT, DEFAULT_CARVE_MASK};
pub use database::{DEFAULT_DB_FILE, DatabaseArgs};
pub use log::LogArgs;

use clap::Args;
use subnetter_allocator::{DEFAULT_PAGE_LIMIT, Page};

/// Listing window.
#[derive(Debug, Args, Clone, Copy)]
pub struct PageArgs {
    /// Maximum records to return (1-200).
    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
    pub limit: u32,

    /// Records to skip, newest first.
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

impl From<PageArgs> for Page {
    fn from(args: PageArgs) -> Self {
        Page::new(args.limit, args.offset)
    }
}
