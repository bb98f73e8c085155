//! In-memory hierarchy store (does not persist across restarts).
//!
//! Reads work on an `Arc` snapshot of the tables. Writes stage their changes
//! on a private copy of the snapshot and publish it only if no other write
//! committed in the meantime; otherwise the commit fails with
//! [`StoreError::WriteConflict`] and the staged copy is dropped.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use subnetter_primitives::{
    Address, AddressId, Block, BlockId, RecordKind, Tenant, TenantId, Vrf, VrfId,
};
use tracing::trace;

use crate::{
    AddressFilter, BlockFilter, HierarchyStore, StoreError, StoreRead, StoreResult, StoreWrite,
    VrfFilter,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    /// Bumped on every successful commit.
    version: u64,
    tenants: BTreeMap<TenantId, Tenant>,
    vrfs: BTreeMap<VrfId, Vrf>,
    blocks: BTreeMap<BlockId, Block>,
    addresses: BTreeMap<AddressId, Address>,
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Arc<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed write transactions.
    pub fn version(&self) -> u64 {
        self.tables.read().version
    }

    fn snapshot(&self) -> Arc<Tables> {
        Arc::clone(&self.tables.read())
    }
}

impl HierarchyStore for MemoryStore {
    fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn StoreRead) -> Result<T, E>,
        E: From<StoreError>,
    {
        let snapshot = self.snapshot();
        f(snapshot.as_ref())
    }

    fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreWrite) -> Result<T, E>,
        E: From<StoreError>,
    {
        let base = self.snapshot();
        let mut staged = Tables::clone(&base);
        let out = f(&mut staged)?;

        let mut tables = self.tables.write();
        if tables.version != base.version {
            trace!(
                base = base.version,
                current = tables.version,
                "memory store write conflict"
            );
            return Err(StoreError::WriteConflict.into());
        }
        staged.version = base.version + 1;
        *tables = Arc::new(staged);
        Ok(out)
    }
}

fn sorted<T: Clone, K: Ord>(
    records: impl Iterator<Item = T>,
    key: impl Fn(&T) -> K,
) -> Vec<T> {
    let mut out: Vec<T> = records.collect();
    out.sort_by_key(key);
    out
}

impl StoreRead for Tables {
    fn tenant(&self, id: TenantId) -> StoreResult<Option<Tenant>> {
        Ok(self.tenants.get(&id).cloned())
    }

    fn tenants(&self) -> StoreResult<Vec<Tenant>> {
        Ok(sorted(self.tenants.values().cloned(), |t| (t.created_at, t.id)))
    }

    fn vrf(&self, id: VrfId) -> StoreResult<Option<Vrf>> {
        Ok(self.vrfs.get(&id).cloned())
    }

    fn vrfs(&self, filter: &VrfFilter) -> StoreResult<Vec<Vrf>> {
        Ok(sorted(
            self.vrfs.values().filter(|v| filter.matches(v)).cloned(),
            |v| (v.created_at, v.id),
        ))
    }

    fn block(&self, id: BlockId) -> StoreResult<Option<Block>> {
        Ok(self.blocks.get(&id).cloned())
    }

    fn blocks(&self, filter: &BlockFilter) -> StoreResult<Vec<Block>> {
        Ok(sorted(
            self.blocks.values().filter(|b| filter.matches(b)).cloned(),
            Block::creation_key,
        ))
    }

    fn address(&self, id: AddressId) -> StoreResult<Option<Address>> {
        Ok(self.addresses.get(&id).cloned())
    }

    fn addresses(&self, filter: &AddressFilter) -> StoreResult<Vec<Address>> {
        Ok(sorted(
            self.addresses.values().filter(|a| filter.matches(a)).cloned(),
            Address::creation_key,
        ))
    }
}

fn insert<K: Ord + ToString + Copy, V: Clone>(
    table: &mut BTreeMap<K, V>,
    kind: RecordKind,
    id: K,
    value: &V,
) -> StoreResult<()> {
    if table.contains_key(&id) {
        return Err(StoreError::duplicate(kind, id));
    }
    table.insert(id, value.clone());
    Ok(())
}

fn update<K: Ord + ToString + Copy, V: Clone>(
    table: &mut BTreeMap<K, V>,
    kind: RecordKind,
    id: K,
    value: &V,
) -> StoreResult<()> {
    match table.get_mut(&id) {
        Some(slot) => {
            *slot = value.clone();
            Ok(())
        }
        None => Err(StoreError::missing(kind, id)),
    }
}

impl StoreWrite for Tables {
    fn insert_tenant(&mut self, tenant: &Tenant) -> StoreResult<()> {
        insert(&mut self.tenants, RecordKind::Tenant, tenant.id, tenant)
    }

    fn update_tenant(&mut self, tenant: &Tenant) -> StoreResult<()> {
        update(&mut self.tenants, RecordKind::Tenant, tenant.id, tenant)
    }

    fn delete_tenant(&mut self, id: TenantId) -> StoreResult<()> {
        self.tenants.remove(&id);
        Ok(())
    }

    fn insert_vrf(&mut self, vrf: &Vrf) -> StoreResult<()> {
        insert(&mut self.vrfs, RecordKind::Vrf, vrf.id, vrf)
    }

    fn update_vrf(&mut self, vrf: &Vrf) -> StoreResult<()> {
        update(&mut self.vrfs, RecordKind::Vrf, vrf.id, vrf)
    }

    fn delete_vrf(&mut self, id: VrfId) -> StoreResult<()> {
        self.vrfs.remove(&id);
        Ok(())
    }

    fn insert_block(&mut self, block: &Block) -> StoreResult<()> {
        insert(&mut self.blocks, RecordKind::Block, block.id, block)
    }

    fn update_block(&mut self, block: &Block) -> StoreResult<()> {
        update(&mut self.blocks, RecordKind::Block, block.id, block)
    }

    fn delete_block(&mut self, id: BlockId) -> StoreResult<()> {
        self.blocks.remove(&id);
        Ok(())
    }

    fn insert_address(&mut self, address: &Address) -> StoreResult<()> {
        insert(&mut self.addresses, RecordKind::Address, address.id, address)
    }

    fn update_address(&mut self, address: &Address) -> StoreResult<()> {
        update(&mut self.addresses, RecordKind::Address, address.id, address)
    }

    fn delete_address(&mut self, id: AddressId) -> StoreResult<()> {
        self.addresses.remove(&id);
        Ok(())
    }
}
