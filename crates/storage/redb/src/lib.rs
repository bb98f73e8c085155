//! redb-backed hierarchy store.
//!
//! [`RedbStore`] keeps tenants, VRFs, blocks and addresses in an embedded
//! redb database. redb admits one write transaction at a time, so every
//! check-and-write performed inside [`HierarchyStore::write`] is serialized
//! against all other writers; readers get MVCC snapshots and never wait on
//! writers.

mod codec;

use std::path::Path;

use redb::{
    Database, MultimapTable, ReadOnlyMultimapTable, ReadOnlyTable, ReadTransaction,
    ReadableMultimapTable, ReadableTable, Table, WriteTransaction,
};
use subnetter_primitives::{Address, AddressId, Block, BlockId, Tenant, TenantId, Vrf, VrfId};
use subnetter_storage::{
    AddressFilter, BlockFilter, HierarchyStore, StoreError, StoreRead, StoreResult, StoreWrite,
    VrfFilter,
};
use tracing::{debug, warn};

use crate::codec::{
    BLOCK_ADDRESSES, BLOCK_CHILDREN, INDEX_TABLES, IndexTable, RECORD_TABLES, Record, RecordTable,
    TENANT_VRFS, VRF_ADDRESSES, VRF_BLOCKS, backend, decode, encode,
};

/// Persistent hierarchy store.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = Database::create(path.as_ref()).map_err(backend)?;

        // Ensure every table exists so read transactions can open them.
        let write_txn = db.begin_write().map_err(backend)?;
        for table in RECORD_TABLES {
            let _ = write_txn.open_table(table).map_err(backend)?;
        }
        for index in INDEX_TABLES {
            let _ = write_txn.open_multimap_table(index).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;

        debug!(path = %path.as_ref().display(), "Opened redb hierarchy store");
        Ok(Self { db })
    }
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl HierarchyStore for RedbStore {
    fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn StoreRead) -> Result<T, E>,
        E: From<StoreError>,
    {
        let txn = Txn(self.db.begin_read().map_err(backend)?);
        f(&txn)
    }

    fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreWrite) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut txn = Txn(self.db.begin_write().map_err(backend)?);
        match f(&mut txn) {
            Ok(out) => {
                txn.0.commit().map_err(backend)?;
                Ok(out)
            }
            Err(err) => {
                if let Err(abort) = txn.0.abort() {
                    warn!(%abort, "Failed to abort redb transaction");
                }
                Err(err)
            }
        }
    }
}

/// Opens tables on either kind of redb transaction.
trait TableSource {
    type Records<'a>: ReadableTable<u128, &'static [u8]>
    where
        Self: 'a;
    type Index<'a>: ReadableMultimapTable<u128, u128>
    where
        Self: 'a;

    fn records(&self, table: RecordTable) -> StoreResult<Self::Records<'_>>;
    fn index(&self, index: IndexTable) -> StoreResult<Self::Index<'_>>;
}

impl TableSource for ReadTransaction {
    type Records<'a> = ReadOnlyTable<u128, &'static [u8]>;
    type Index<'a> = ReadOnlyMultimapTable<u128, u128>;

    fn records(&self, table: RecordTable) -> StoreResult<Self::Records<'_>> {
        self.open_table(table).map_err(backend)
    }

    fn index(&self, index: IndexTable) -> StoreResult<Self::Index<'_>> {
        self.open_multimap_table(index).map_err(backend)
    }
}

impl TableSource for WriteTransaction {
    type Records<'a> = Table<'a, u128, &'static [u8]>;
    type Index<'a> = MultimapTable<'a, u128, u128>;

    fn records(&self, table: RecordTable) -> StoreResult<Self::Records<'_>> {
        self.open_table(table).map_err(backend)
    }

    fn index(&self, index: IndexTable) -> StoreResult<Self::Index<'_>> {
        self.open_multimap_table(index).map_err(backend)
    }
}

/// A read or write transaction seen through the store traits.
struct Txn<T>(T);

impl<T: TableSource> Txn<T> {
    fn get<R: Record>(&self, key: u128) -> StoreResult<Option<R>> {
        let table = self.0.records(R::TABLE)?;
        let value = table.get(key).map_err(backend)?;
        value.map(|guard| decode(guard.value())).transpose()
    }

    fn all<R: Record>(&self) -> StoreResult<Vec<R>> {
        let table = self.0.records(R::TABLE)?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(backend)? {
            let (_, value) = entry.map_err(backend)?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }

    /// Records listed under `owner` in `index`.
    fn indexed<R: Record>(&self, index: IndexTable, owner: u128) -> StoreResult<Vec<R>> {
        let keys = {
            let index = self.0.index(index)?;
            let mut keys = Vec::new();
            for entry in index.get(owner).map_err(backend)? {
                keys.push(entry.map_err(backend)?.value());
            }
            keys
        };

        let table = self.0.records(R::TABLE)?;
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            // Index entries are written in the same transaction as the record.
            if let Some(value) = table.get(key).map_err(backend)? {
                out.push(decode(value.value())?);
            }
        }
        Ok(out)
    }
}

fn sorted_by<T, K: Ord>(mut records: Vec<T>, key: impl FnMut(&T) -> K) -> Vec<T> {
    records.sort_by_key(key);
    records
}

impl<T: TableSource> StoreRead for Txn<T> {
    fn tenant(&self, id: TenantId) -> StoreResult<Option<Tenant>> {
        self.get(id.as_u128())
    }

    fn tenants(&self) -> StoreResult<Vec<Tenant>> {
        Ok(sorted_by(self.all()?, |t: &Tenant| (t.created_at, t.id)))
    }

    fn vrf(&self, id: VrfId) -> StoreResult<Option<Vrf>> {
        self.get(id.as_u128())
    }

    fn vrfs(&self, filter: &VrfFilter) -> StoreResult<Vec<Vrf>> {
        let vrfs: Vec<Vrf> = match filter.tenant {
            Some(tenant) => self.indexed(TENANT_VRFS, tenant.as_u128())?,
            None => self.all()?,
        };
        Ok(sorted_by(vrfs, |v| (v.created_at, v.id)))
    }

    fn block(&self, id: BlockId) -> StoreResult<Option<Block>> {
        self.get(id.as_u128())
    }

    fn blocks(&self, filter: &BlockFilter) -> StoreResult<Vec<Block>> {
        let blocks: Vec<Block> = match (filter.parent, filter.vrf) {
            (Some(parent), _) => self.indexed(BLOCK_CHILDREN, parent.as_u128())?,
            (None, Some(vrf)) => self.indexed(VRF_BLOCKS, vrf.as_u128())?,
            (None, None) => self.all()?,
        };
        let blocks = blocks.into_iter().filter(|b| filter.matches(b)).collect();
        Ok(sorted_by(blocks, Block::creation_key))
    }

    fn address(&self, id: AddressId) -> StoreResult<Option<Address>> {
        self.get(id.as_u128())
    }

    fn addresses(&self, filter: &AddressFilter) -> StoreResult<Vec<Address>> {
        let addresses: Vec<Address> = match (filter.block, filter.vrf) {
            (Some(block), _) => self.indexed(BLOCK_ADDRESSES, block.as_u128())?,
            (None, Some(vrf)) => self.indexed(VRF_ADDRESSES, vrf.as_u128())?,
            (None, None) => self.all()?,
        };
        let addresses = addresses.into_iter().filter(|a| filter.matches(a)).collect();
        Ok(sorted_by(addresses, Address::creation_key))
    }
}

impl Txn<WriteTransaction> {
    fn insert<R: Record>(&mut self, record: &R) -> StoreResult<()> {
        let key = record.key();
        let bytes = encode(record)?;
        {
            let mut table = self.0.records(R::TABLE)?;
            if table.get(key).map_err(backend)?.is_some() {
                return Err(StoreError::duplicate(R::KIND, record.id_text()));
            }
            table.insert(key, bytes.as_slice()).map_err(backend)?;
        }
        self.add_index_entries(record)
    }

    fn update<R: Record>(&mut self, record: &R) -> StoreResult<()> {
        let key = record.key();
        let previous: R = self
            .get(key)?
            .ok_or_else(|| StoreError::missing(R::KIND, record.id_text()))?;

        let bytes = encode(record)?;
        {
            let mut table = self.0.records(R::TABLE)?;
            table.insert(key, bytes.as_slice()).map_err(backend)?;
        }

        self.remove_index_entries(&previous)?;
        self.add_index_entries(record)
    }

    fn delete<R: Record>(&mut self, key: u128) -> StoreResult<()> {
        let removed: Option<R> = {
            let mut table = self.0.records(R::TABLE)?;
            let removed = table.remove(key).map_err(backend)?;
            removed.map(|guard| decode(guard.value())).transpose()?
        };
        match removed {
            Some(record) => self.remove_index_entries(&record),
            None => Ok(()),
        }
    }

    fn add_index_entries<R: Record>(&mut self, record: &R) -> StoreResult<()> {
        for (index, owner) in record.index_entries() {
            let mut index = self.0.index(index)?;
            index.insert(owner, record.key()).map_err(backend)?;
        }
        Ok(())
    }

    fn remove_index_entries<R: Record>(&mut self, record: &R) -> StoreResult<()> {
        for (index, owner) in record.index_entries() {
            let mut index = self.0.index(index)?;
            index.remove(owner, record.key()).map_err(backend)?;
        }
        Ok(())
    }
}

impl StoreWrite for Txn<WriteTransaction> {
    fn insert_tenant(&mut self, tenant: &Tenant) -> StoreResult<()> {
        self.insert(tenant)
    }

    fn update_tenant(&mut self, tenant: &Tenant) -> StoreResult<()> {
        self.update(tenant)
    }

    fn delete_tenant(&mut self, id: TenantId) -> StoreResult<()> {
        self.delete::<Tenant>(id.as_u128())
    }

    fn insert_vrf(&mut self, vrf: &Vrf) -> StoreResult<()> {
        self.insert(vrf)
    }

    fn update_vrf(&mut self, vrf: &Vrf) -> StoreResult<()> {
        self.update(vrf)
    }

    fn delete_vrf(&mut self, id: VrfId) -> StoreResult<()> {
        self.delete::<Vrf>(id.as_u128())
    }

    fn insert_block(&mut self, block: &Block) -> StoreResult<()> {
        self.insert(block)
    }

    fn update_block(&mut self, block: &Block) -> StoreResult<()> {
        self.update(block)
    }

    fn delete_block(&mut self, id: BlockId) -> StoreResult<()> {
        self.delete::<Block>(id.as_u128())
    }

    fn insert_address(&mut self, address: &Address) -> StoreResult<()> {
        self.insert(address)
    }

    fn update_address(&mut self, address: &Address) -> StoreResult<()> {
        self.update(address)
    }

    fn delete_address(&mut self, id: AddressId) -> StoreResult<()> {
        self.delete::<Address>(id.as_u128())
    }
}
