//! Database CLI arguments.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::{Deserialize, Serialize};

/// Database file used when no path is configured.
pub const DEFAULT_DB_FILE: &str = "subnetter.redb";

/// Database configuration.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Database")]
#[serde(default)]
pub struct DatabaseArgs {
    /// Path of the redb database file.
    #[arg(long = "db.path", value_name = "FILE", global = true)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Use an in-memory store (nothing persists after the command exits).
    #[arg(long = "db.memory", global = true)]
    pub memory_only: bool,
}

impl DatabaseArgs {
    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or(Path::new(DEFAULT_DB_FILE))
    }

    /// Layer flags given on the command line over loaded configuration.
    pub fn merge(&mut self, cli: &Self) {
        if cli.path.is_some() {
            self.path.clone_from(&cli.path);
        }
        self.memory_only |= cli.memory_only;
    }
}
