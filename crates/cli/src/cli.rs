//! CLI argument assembly and top-level parser.

use std::{net::IpAddr, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use subnetter_primitives::{
    AddressId, AddressStatus, BlockId, BlockStatus, CarveStrategy, TenantId, VrfId,
};

use crate::args::{AllocatorArgs, DatabaseArgs, LogArgs, PageArgs};

/// Subnetter - IPv4/IPv6 address-space management
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Idempotency key attached to allocation requests.
    #[arg(long = "idem", env = "SUBNETTER_IDEMPOTENCY_KEY", global = true)]
    pub idempotency_key: Option<String>,

    /// Logging configuration.
    #[command(flatten)]
    pub logs: LogArgs,

    /// Database configuration.
    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Allocator configuration.
    #[command(flatten)]
    pub allocator: AllocatorArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Subnetter commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage tenants.
    #[command(subcommand)]
    Tenant(TenantCommand),

    /// Manage VRFs.
    #[command(subcommand)]
    Vrf(VrfCommand),

    /// Manage prefixes (blocks).
    #[command(subcommand)]
    Prefix(PrefixCommand),

    /// Manage host addresses.
    #[command(subcommand)]
    Ip(IpCommand),

    /// Create a tenant, VRF and prefix, carve children and allocate an
    /// address in the first child.
    Seed(SeedArgs),
}

#[derive(Debug, Subcommand)]
pub enum TenantCommand {
    /// Create a tenant.
    Create {
        name: String,
    },
    /// Show a tenant.
    Get {
        id: TenantId,
    },
    /// List tenants, newest first.
    List {
        /// Case-insensitive name filter.
        #[arg(long = "q")]
        name_contains: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Rename a tenant.
    Update {
        id: TenantId,
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete a tenant without VRFs.
    Delete {
        id: TenantId,
    },
}

#[derive(Debug, Subcommand)]
pub enum VrfCommand {
    /// Create a VRF.
    Create {
        #[arg(long)]
        tenant: TenantId,
        name: String,
        /// Route distinguisher.
        #[arg(long)]
        rd: Option<String>,
    },
    /// Show a VRF.
    Get {
        id: VrfId,
    },
    /// List VRFs, newest first.
    List {
        #[arg(long)]
        tenant: Option<TenantId>,
        /// Case-insensitive name filter.
        #[arg(long = "q")]
        name_contains: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Change a VRF's name or route distinguisher.
    Update {
        id: VrfId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        rd: Option<String>,
    },
    /// Delete a VRF without blocks or addresses.
    Delete {
        id: VrfId,
    },
}

#[derive(Debug, Subcommand)]
pub enum PrefixCommand {
    /// Register a prefix.
    Create {
        #[arg(long)]
        vrf: VrfId,
        cidr: String,
        /// container, active or reserved.
        #[arg(long, default_value_t = BlockStatus::Active)]
        status: BlockStatus,
        #[arg(long)]
        description: Option<String>,
        /// Register as a child of this prefix.
        #[arg(long)]
        parent: Option<BlockId>,
    },
    /// Show a prefix.
    Get {
        id: BlockId,
    },
    /// List prefixes, newest first.
    List {
        #[arg(long)]
        vrf: Option<VrfId>,
        #[arg(long)]
        parent: Option<BlockId>,
        #[arg(long)]
        status: Option<BlockStatus>,
        #[arg(long)]
        mask: Option<u8>,
        /// Only prefixes inside this CIDR.
        #[arg(long)]
        within: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Change a prefix's status or description.
    Update {
        id: BlockId,
        #[arg(long)]
        status: Option<BlockStatus>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a prefix without children or addresses.
    Delete {
        id: BlockId,
    },
    /// Carve child prefixes out of a parent.
    Carve {
        id: BlockId,
        /// Child prefix length (defaults to the configured carve mask).
        #[arg(long)]
        mask: Option<u8>,
        /// Number of children (defaults to the configured carve count).
        #[arg(long)]
        count: Option<u32>,
        /// first-fit or dense.
        #[arg(long, default_value_t = CarveStrategy::FirstFit)]
        strategy: CarveStrategy,
    },
    /// List free child prefixes of a given length.
    Free {
        id: BlockId,
        #[arg(long)]
        mask: u8,
        /// List at most this many (defaults to the configured maximum).
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(Debug, Subcommand)]
pub enum IpCommand {
    /// Allocate the lowest free address of a prefix.
    Next {
        prefix: BlockId,
    },
    /// Register a specific address.
    Create {
        #[arg(long)]
        vrf: VrfId,
        #[arg(long)]
        prefix: BlockId,
        address: String,
        #[arg(long, default_value_t = AddressStatus::Active)]
        status: AddressStatus,
        #[arg(long)]
        note: Option<String>,
    },
    /// Show an address.
    Get {
        id: AddressId,
    },
    /// List addresses, newest first.
    List {
        #[arg(long)]
        vrf: Option<VrfId>,
        #[arg(long)]
        prefix: Option<BlockId>,
        #[arg(long)]
        status: Option<AddressStatus>,
        #[arg(long)]
        address: Option<IpAddr>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Change an address's status or note.
    Update {
        id: AddressId,
        #[arg(long)]
        status: Option<AddressStatus>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Release an address.
    Delete {
        id: AddressId,
    },
}

/// Arguments for the `seed` command.
#[derive(Debug, Args)]
pub struct SeedArgs {
    #[arg(long = "tenant-name", default_value = "DemoTenant")]
    pub tenant: String,

    #[arg(long = "vrf-name", default_value = "demo-vrf")]
    pub vrf: String,

    /// Route distinguisher; empty for none.
    #[arg(long, default_value = "65000:1")]
    pub rd: String,

    #[arg(long, default_value = "10.0.0.0/24")]
    pub cidr: String,

    #[arg(long, default_value_t = BlockStatus::Active)]
    pub status: BlockStatus,

    /// Child prefix length (defaults to the configured carve mask).
    #[arg(long)]
    pub mask: Option<u8>,

    #[arg(long, default_value_t = 2)]
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_carve() {
        let id = BlockId::random();
        let cli = Cli::try_parse_from([
            "subnetter",
            "--db.memory",
            "prefix",
            "carve",
            &id.to_string(),
            "--mask",
            "26",
            "--strategy",
            "dense",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(cli.database.memory_only);
        assert_matches!(
            cli.command,
            Commands::Prefix(PrefixCommand::Carve {
                id: parsed,
                mask: Some(26),
                count: None,
                strategy: CarveStrategy::Dense,
            }) if parsed == id
        );
    }

    #[test]
    fn test_parse_free_with_limit() {
        let id = BlockId::random();
        let cli = Cli::try_parse_from([
            "subnetter",
            "prefix",
            "free",
            &id.to_string(),
            "--mask",
            "128",
            "--limit",
            "16",
            "--free.max-count",
            "64",
        ])
        .unwrap();
        assert_eq!(cli.allocator.max_free_blocks, Some(64));
        assert_matches!(
            cli.command,
            Commands::Prefix(PrefixCommand::Free { id: parsed, mask: 128, limit: Some(16) })
                if parsed == id
        );
    }

    #[test]
    fn test_seed_defaults() {
        let cli = Cli::try_parse_from(["subnetter", "seed"]).unwrap();
        let Commands::Seed(seed) = cli.command else {
            panic!("expected seed");
        };
        assert_eq!(seed.tenant, "DemoTenant");
        assert_eq!(seed.vrf, "demo-vrf");
        assert_eq!(seed.rd, "65000:1");
        assert_eq!(seed.cidr, "10.0.0.0/24");
        assert_eq!(seed.mask, None);
        assert_eq!(seed.count, 2);
    }

    #[test]
    fn test_rejects_unknown_status() {
        assert!(
            Cli::try_parse_from(["subnetter", "prefix", "update", &BlockId::random().to_string(), "--status", "retired"])
                .is_err()
        );
    }
}
