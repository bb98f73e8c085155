//! Record encoding and table layout.
//!
//! Records are stored as postcard bytes keyed by the `u128` form of their id.
//! Secondary indexes are multimap tables from an owner id to record ids.

use redb::{MultimapTableDefinition, TableDefinition};
use serde::{Serialize, de::DeserializeOwned};
use subnetter_primitives::{Address, Block, RecordKind, Tenant, Vrf};
use subnetter_storage::{StoreError, StoreResult};

pub(crate) type RecordTable = TableDefinition<'static, u128, &'static [u8]>;
pub(crate) type IndexTable = MultimapTableDefinition<'static, u128, u128>;

pub(crate) const TENANTS: RecordTable = TableDefinition::new("tenants");
pub(crate) const VRFS: RecordTable = TableDefinition::new("vrfs");
pub(crate) const BLOCKS: RecordTable = TableDefinition::new("blocks");
pub(crate) const ADDRESSES: RecordTable = TableDefinition::new("addresses");

/// tenant -> vrf
pub(crate) const TENANT_VRFS: IndexTable = MultimapTableDefinition::new("tenant_vrfs");
/// vrf -> block
pub(crate) const VRF_BLOCKS: IndexTable = MultimapTableDefinition::new("vrf_blocks");
/// parent block -> child block
pub(crate) const BLOCK_CHILDREN: IndexTable = MultimapTableDefinition::new("block_children");
/// vrf -> address
pub(crate) const VRF_ADDRESSES: IndexTable = MultimapTableDefinition::new("vrf_addresses");
/// block -> address
pub(crate) const BLOCK_ADDRESSES: IndexTable = MultimapTableDefinition::new("block_addresses");

pub(crate) const RECORD_TABLES: [RecordTable; 4] = [TENANTS, VRFS, BLOCKS, ADDRESSES];
pub(crate) const INDEX_TABLES: [IndexTable; 5] = [
    TENANT_VRFS,
    VRF_BLOCKS,
    BLOCK_CHILDREN,
    VRF_ADDRESSES,
    BLOCK_ADDRESSES,
];

/// A record type with its table and index memberships.
pub(crate) trait Record: Serialize + DeserializeOwned {
    const KIND: RecordKind;
    const TABLE: RecordTable;

    fn key(&self) -> u128;

    fn id_text(&self) -> String;

    /// `(index, owner key)` pairs this record is listed under.
    fn index_entries(&self) -> Vec<(IndexTable, u128)>;
}

impl Record for Tenant {
    const KIND: RecordKind = RecordKind::Tenant;
    const TABLE: RecordTable = TENANTS;

    fn key(&self) -> u128 {
        self.id.as_u128()
    }

    fn id_text(&self) -> String {
        self.id.to_string()
    }

    fn index_entries(&self) -> Vec<(IndexTable, u128)> {
        Vec::new()
    }
}

impl Record for Vrf {
    const KIND: RecordKind = RecordKind::Vrf;
    const TABLE: RecordTable = VRFS;

    fn key(&self) -> u128 {
        self.id.as_u128()
    }

    fn id_text(&self) -> String {
        self.id.to_string()
    }

    fn index_entries(&self) -> Vec<(IndexTable, u128)> {
        vec![(TENANT_VRFS, self.tenant_id.as_u128())]
    }
}

impl Record for Block {
    const KIND: RecordKind = RecordKind::Block;
    const TABLE: RecordTable = BLOCKS;

    fn key(&self) -> u128 {
        self.id.as_u128()
    }

    fn id_text(&self) -> String {
        self.id.to_string()
    }

    fn index_entries(&self) -> Vec<(IndexTable, u128)> {
        let mut entries = vec![(VRF_BLOCKS, self.vrf_id.as_u128())];
        if let Some(parent) = self.parent_id {
            entries.push((BLOCK_CHILDREN, parent.as_u128()));
        }
        entries
    }
}

impl Record for Address {
    const KIND: RecordKind = RecordKind::Address;
    const TABLE: RecordTable = ADDRESSES;

    fn key(&self) -> u128 {
        self.id.as_u128()
    }

    fn id_text(&self) -> String {
        self.id.to_string()
    }

    fn index_entries(&self) -> Vec<(IndexTable, u128)> {
        vec![
            (VRF_ADDRESSES, self.vrf_id.as_u128()),
            (BLOCK_ADDRESSES, self.block_id.as_u128()),
        ]
    }
}

pub(crate) fn encode<R: Record>(record: &R) -> StoreResult<Vec<u8>> {
    postcard::to_allocvec(record)
        .map_err(|err| StoreError::Backend(format!("failed to encode {}: {err}", R::KIND)))
}

pub(crate) fn decode<R: Record>(bytes: &[u8]) -> StoreResult<R> {
    postcard::from_bytes(bytes).map_err(|_| StoreError::Decode(R::KIND))
}

/// Map any redb error into a backend store error.
pub(crate) fn backend<E: Into<redb::Error>>(err: E) -> StoreError {
    StoreError::Backend(err.into().to_string())
}
