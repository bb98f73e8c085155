//! Records held by the hierarchy store.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AddressId, AddressStatus, BlockId, BlockStatus, Cidr, IpFamily, TenantId, VrfId,
    range::AddrRange,
};

/// Kind of record, used in error reporting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordKind {
    Tenant,
    Vrf,
    Block,
    Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// An isolated addressing context owned by a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vrf {
    pub id: VrfId,
    pub tenant_id: TenantId,
    pub name: String,
    /// Route distinguisher, free-form.
    pub rd: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A contiguous address block (prefix) within one VRF.
///
/// The range is fixed at creation; only status and description change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub vrf_id: VrfId,
    pub cidr: Cidr,
    pub status: BlockStatus,
    pub description: String,
    pub parent_id: Option<BlockId>,
    pub created_at: DateTime<Utc>,
}

impl Block {
    pub fn range(&self) -> AddrRange {
        self.cidr.range()
    }

    pub fn family(&self) -> IpFamily {
        self.cidr.family()
    }

    pub fn prefix_len(&self) -> u8 {
        self.cidr.prefix_len()
    }

    /// Whether this block claims its range against overlap.
    pub fn is_claiming(&self) -> bool {
        self.status.is_claiming()
    }

    /// Ascending creation order key.
    pub fn creation_key(&self) -> (DateTime<Utc>, BlockId) {
        (self.created_at, self.id)
    }
}

/// A single host address assigned within a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub vrf_id: VrfId,
    pub block_id: BlockId,
    pub address: IpAddr,
    pub status: AddressStatus,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// Ascending creation order key.
    pub fn creation_key(&self) -> (DateTime<Utc>, AddressId) {
        (self.created_at, self.id)
    }
}
