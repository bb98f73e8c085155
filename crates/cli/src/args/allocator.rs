//! Allocator CLI arguments.

use clap::Args;
use serde::{Deserialize, Serialize};
use subnetter_allocator::{AllocatorConfig, DEFAULT_MAX_CARVE_COUNT, DEFAULT_MAX_FREE_BLOCKS};

/// Child prefix length used by `prefix carve` and `seed` without `--mask`.
pub const DEFAULT_CARVE_MASK: u8 = 28;

/// Child count used by `prefix carve` without `--count`.
pub const DEFAULT_CARVE_COUNT: u32 = 1;

/// Allocator configuration. Unset fields fall back to the defaults above.
#[derive(Debug, Args, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Allocator")]
#[serde(default)]
pub struct AllocatorArgs {
    /// Default child prefix length for carving.
    #[arg(long = "carve.mask", value_name = "LEN", global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_carve_mask: Option<u8>,

    /// Default number of children per carve.
    #[arg(long = "carve.count", value_name = "N", global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_carve_count: Option<u32>,

    /// Upper bound on children per carve.
    #[arg(long = "carve.max-count", value_name = "N", global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_carve_count: Option<u32>,

    /// Upper bound on prefixes listed by `prefix free`.
    #[arg(long = "free.max-count", value_name = "N", global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_free_blocks: Option<u32>,
}

impl AllocatorArgs {
    pub fn carve_mask(&self) -> u8 {
        self.default_carve_mask.unwrap_or(DEFAULT_CARVE_MASK)
    }

    pub fn carve_count(&self) -> u32 {
        self.default_carve_count.unwrap_or(DEFAULT_CARVE_COUNT)
    }

    pub fn engine_config(&self) -> AllocatorConfig {
        AllocatorConfig {
            max_carve_count: self.max_carve_count.unwrap_or(DEFAULT_MAX_CARVE_COUNT),
            max_free_blocks: self.max_free_blocks.unwrap_or(DEFAULT_MAX_FREE_BLOCKS),
            ..AllocatorConfig::default()
        }
    }

    /// Layer flags given on the command line over loaded configuration.
    pub fn merge(&mut self, cli: &Self) {
        self.default_carve_mask = cli.default_carve_mask.or(self.default_carve_mask);
        self.default_carve_count = cli.default_carve_count.or(self.default_carve_count);
        self.max_carve_count = cli.max_carve_count.or(self.max_carve_count);
        self.max_free_blocks = cli.max_free_blocks.or(self.max_free_blocks);
    }
}
