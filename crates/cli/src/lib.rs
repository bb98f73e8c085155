//! Command-line interface for subnetter.
//!
//! This crate provides:
//! - [`Cli`] - Top-level CLI parser
//! - [`Commands`] - Available subcommands
//! - [`SubnetterConfig`] - Layered configuration
//!
//! Configuration is loaded using Figment with the following priority
//! (highest wins):
//!
//! 1. CLI arguments
//! 2. Config file (TOML, `--config`)
//! 3. Environment variables (`SUBNETTER_` prefix)
//! 4. Defaults

pub mod args;
mod cli;
mod commands;
pub mod config;
mod logging;
mod output;
mod store;

pub use cli::{Cli, Commands, IpCommand, PrefixCommand, SeedArgs, TenantCommand, VrfCommand};
pub use config::SubnetterConfig;
pub use store::AnyStore;

use clap::Parser;
use subnetter_allocator::Ipam;
use tracing::debug;

use crate::{commands::Context, output::Output};

/// Parse the command line and run the selected command.
///
/// This is the main entry point that should be called from the binary.
pub fn run() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logging(&cli.logs)?;

    let config = SubnetterConfig::load(cli.config.as_deref())?.with_cli(&cli.database, &cli.allocator);
    debug!(?config, "loaded configuration");

    let store = AnyStore::open(&config.database)?;
    let ipam = Ipam::with_config(store, config.allocator.engine_config());

    let ctx = Context {
        ipam: &ipam,
        config: &config,
        out: Output::new(cli.json),
        idempotency_key: cli.idempotency_key.as_deref(),
    };
    commands::dispatch(&ctx, cli.command)
}
