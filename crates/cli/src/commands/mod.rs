//! Command implementations.

mod ip;
mod prefix;
mod scopes;
mod seed;

use eyre::Result;
use subnetter_allocator::Ipam;
use subnetter_storage::HierarchyStore;

use crate::{cli::Commands, config::SubnetterConfig, output::Output};

/// Everything a command needs besides its own arguments.
pub(crate) struct Context<'a, S> {
    pub(crate) ipam: &'a Ipam<S>,
    pub(crate) config: &'a SubnetterConfig,
    pub(crate) out: Output,
    pub(crate) idempotency_key: Option<&'a str>,
}

pub(crate) fn dispatch<S: HierarchyStore>(ctx: &Context<'_, S>, command: Commands) -> Result<()> {
    match command {
        Commands::Tenant(cmd) => scopes::tenant(ctx, cmd),
        Commands::Vrf(cmd) => scopes::vrf(ctx, cmd),
        Commands::Prefix(cmd) => prefix::run(ctx, cmd),
        Commands::Ip(cmd) => ip::run(ctx, cmd),
        Commands::Seed(args) => seed::run(ctx, args),
    }
}
