//! Store selection.

use eyre::{Result, WrapErr};
use subnetter_storage::{HierarchyStore, MemoryStore, StoreError, StoreRead, StoreWrite};
use subnetter_storage_redb::RedbStore;
use tracing::debug;

use crate::args::DatabaseArgs;

/// The backend picked by `--db.memory` / `--db.path`.
#[derive(Debug)]
pub enum AnyStore {
    Memory(MemoryStore),
    Redb(RedbStore),
}

impl AnyStore {
    pub fn open(args: &DatabaseArgs) -> Result<Self> {
        if args.memory_only {
            debug!("using in-memory store");
            return Ok(Self::Memory(MemoryStore::new()));
        }
        let path = args.path();
        debug!(path = %path.display(), "opening redb store");
        let store = RedbStore::open(path)
            .wrap_err_with(|| format!("Failed to open database at {}", path.display()))?;
        Ok(Self::Redb(store))
    }
}

impl HierarchyStore for AnyStore {
    fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn StoreRead) -> Result<T, E>,
        E: From<StoreError>,
    {
        match self {
            Self::Memory(store) => store.read(f),
            Self::Redb(store) => store.read(f),
        }
    }

    fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreWrite) -> Result<T, E>,
        E: From<StoreError>,
    {
        match self {
            Self::Memory(store) => store.write(f),
            Self::Redb(store) => store.write(f),
        }
    }
}
