//! Hierarchy store for subnetter.
//!
//! The allocation engine never owns persistence. It talks to a
//! [`HierarchyStore`], which hands out read views ([`StoreRead`]) and write
//! transactions ([`StoreWrite`]). Blocks live in a flat table keyed by id;
//! children are found by filtering on `parent_id`, never by back-references.
//!
//! Backends:
//! - [`MemoryStore`] - optimistic, copy-on-commit, in-process
//! - `subnetter-storage-redb` - persistent, single-writer redb database

mod error;
mod filter;
mod memory;

use auto_impl::auto_impl;
use subnetter_primitives::{Address, AddressId, Block, BlockId, Tenant, TenantId, Vrf, VrfId};

pub use error::{StoreError, StoreResult};
pub use filter::{AddressFilter, BlockFilter, VrfFilter};
pub use memory::MemoryStore;

/// Read access to the hierarchy.
///
/// Listing methods return records in ascending creation order
/// (`created_at`, then id), so scans over them are deterministic.
pub trait StoreRead {
    fn tenant(&self, id: TenantId) -> StoreResult<Option<Tenant>>;
    fn tenants(&self) -> StoreResult<Vec<Tenant>>;

    fn vrf(&self, id: VrfId) -> StoreResult<Option<Vrf>>;
    fn vrfs(&self, filter: &VrfFilter) -> StoreResult<Vec<Vrf>>;

    fn block(&self, id: BlockId) -> StoreResult<Option<Block>>;
    fn blocks(&self, filter: &BlockFilter) -> StoreResult<Vec<Block>>;

    fn address(&self, id: AddressId) -> StoreResult<Option<Address>>;
    fn addresses(&self, filter: &AddressFilter) -> StoreResult<Vec<Address>>;
}

/// Write access inside a transaction.
///
/// `insert_*` fails with [`StoreError::Duplicate`] when the id exists,
/// `update_*` fails with [`StoreError::Missing`] when it does not, and
/// `delete_*` of a missing id is a no-op.
pub trait StoreWrite: StoreRead {
    fn insert_tenant(&mut self, tenant: &Tenant) -> StoreResult<()>;
    fn update_tenant(&mut self, tenant: &Tenant) -> StoreResult<()>;
    fn delete_tenant(&mut self, id: TenantId) -> StoreResult<()>;

    fn insert_vrf(&mut self, vrf: &Vrf) -> StoreResult<()>;
    fn update_vrf(&mut self, vrf: &Vrf) -> StoreResult<()>;
    fn delete_vrf(&mut self, id: VrfId) -> StoreResult<()>;

    fn insert_block(&mut self, block: &Block) -> StoreResult<()>;
    fn update_block(&mut self, block: &Block) -> StoreResult<()>;
    fn delete_block(&mut self, id: BlockId) -> StoreResult<()>;

    fn insert_address(&mut self, address: &Address) -> StoreResult<()>;
    fn update_address(&mut self, address: &Address) -> StoreResult<()>;
    fn delete_address(&mut self, id: AddressId) -> StoreResult<()>;
}

/// A shared hierarchy store with transactional access.
///
/// # Transactions
///
/// [`write`](HierarchyStore::write) runs the closure inside one serializable
/// transaction: everything it writes is committed atomically when it returns
/// `Ok`, and nothing is persisted when it returns `Err`. A backend that
/// detects a concurrent writer at commit time fails with
/// [`StoreError::WriteConflict`].
///
/// [`read`](HierarchyStore::read) sees a consistent snapshot and never blocks
/// writers for longer than it takes to take the snapshot.
#[auto_impl(&, Box, Arc)]
pub trait HierarchyStore: Send + Sync {
    fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn StoreRead) -> Result<T, E>,
        E: From<StoreError>;

    fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreWrite) -> Result<T, E>,
        E: From<StoreError>;
}
