//! Figment-based configuration loading.
//!
//! Configuration priority (highest wins):
//! 1. CLI arguments (applied after Figment load)
//! 2. Config file (TOML)
//! 3. Environment variables (`SUBNETTER_` prefix, `__` between sections)
//! 4. Defaults

use std::path::Path;

use eyre::{Result, WrapErr};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::args::{AllocatorArgs, DatabaseArgs};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "SUBNETTER_";

/// Complete tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubnetterConfig {
    /// Store configuration.
    pub database: DatabaseArgs,

    /// Allocation defaults and limits.
    pub allocator: AllocatorArgs,
}

impl SubnetterConfig {
    /// Load configuration from defaults, environment, and config file.
    /// CLI overrides should be applied separately after loading.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(SubnetterConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        if let Some(path) = config_path {
            if !path.exists() {
                eyre::bail!("config file {} does not exist", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        figment.extract().wrap_err("Failed to load configuration")
    }

    /// Apply command-line flags on top of the loaded configuration.
    pub fn with_cli(mut self, database: &DatabaseArgs, allocator: &AllocatorArgs) -> Self {
        self.database.merge(database);
        self.allocator.merge(allocator);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use tempfile::TempDir;

    use super::*;
    use crate::args::{DEFAULT_CARVE_MASK, DEFAULT_DB_FILE};

    #[test]
    fn test_default_config() {
        let config = SubnetterConfig::default();
        assert!(!config.database.memory_only);
        assert_eq!(config.database.path(), Path::new(DEFAULT_DB_FILE));
        assert_eq!(config.allocator.carve_mask(), DEFAULT_CARVE_MASK);
        assert_eq!(config.allocator.engine_config().max_carve_count, 4096);
        assert_eq!(config.allocator.engine_config().max_free_blocks, 4096);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("subnetter.toml");

        fs::write(
            &config_path,
            r#"
[database]
path = "/var/lib/subnetter/ipam.redb"

[allocator]
default_carve_mask = 26
max_carve_count = 64
max_free_blocks = 256
"#,
        )
        .unwrap();

        let config = SubnetterConfig::load(Some(&config_path)).unwrap();
        assert_eq!(
            config.database.path(),
            Path::new("/var/lib/subnetter/ipam.redb")
        );
        assert_eq!(config.allocator.carve_mask(), 26);
        assert_eq!(config.allocator.carve_count(), 1);
        assert_eq!(config.allocator.engine_config().max_carve_count, 64);
        assert_eq!(config.allocator.engine_config().max_free_blocks, 256);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.toml");
        assert!(SubnetterConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let loaded = SubnetterConfig {
            database: DatabaseArgs {
                path: Some(PathBuf::from("from-file.redb")),
                memory_only: false,
            },
            allocator: AllocatorArgs {
                default_carve_mask: Some(26),
                default_carve_count: Some(4),
                max_carve_count: None,
                max_free_blocks: None,
            },
        };
        let cli_db = DatabaseArgs {
            path: None,
            memory_only: true,
        };
        let cli_alloc = AllocatorArgs {
            default_carve_mask: Some(30),
            ..Default::default()
        };

        let config = loaded.with_cli(&cli_db, &cli_alloc);
        assert!(config.database.memory_only);
        assert_eq!(config.database.path(), Path::new("from-file.redb"));
        assert_eq!(config.allocator.carve_mask(), 30);
        assert_eq!(config.allocator.carve_count(), 4);
    }
}
