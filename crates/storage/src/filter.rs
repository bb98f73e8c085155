//! Listing filters understood by every store backend.

use std::net::IpAddr;

use subnetter_primitives::{
    Address, AddressStatus, Block, BlockId, BlockStatus, TenantId, Vrf, VrfId,
};

/// Selects blocks by VRF, parent, status and prefix length.
///
/// Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockFilter {
    pub vrf: Option<VrfId>,
    pub parent: Option<BlockId>,
    pub status: Option<BlockStatus>,
    pub prefix_len: Option<u8>,
}

impl BlockFilter {
    pub fn in_vrf(vrf: VrfId) -> Self {
        Self {
            vrf: Some(vrf),
            ..Default::default()
        }
    }

    pub fn children_of(parent: BlockId) -> Self {
        Self {
            parent: Some(parent),
            ..Default::default()
        }
    }

    pub fn matches(&self, block: &Block) -> bool {
        self.vrf.is_none_or(|vrf| block.vrf_id == vrf)
            && self.parent.is_none_or(|parent| block.parent_id == Some(parent))
            && self.status.is_none_or(|status| block.status == status)
            && self.prefix_len.is_none_or(|len| block.prefix_len() == len)
    }
}

/// Selects host addresses by VRF, owning block, status and value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressFilter {
    pub vrf: Option<VrfId>,
    pub block: Option<BlockId>,
    pub status: Option<AddressStatus>,
    pub address: Option<IpAddr>,
}

impl AddressFilter {
    pub fn in_vrf(vrf: VrfId) -> Self {
        Self {
            vrf: Some(vrf),
            ..Default::default()
        }
    }

    pub fn in_block(block: BlockId) -> Self {
        Self {
            block: Some(block),
            ..Default::default()
        }
    }

    pub fn with_address(mut self, address: IpAddr) -> Self {
        self.address = Some(address);
        self
    }

    pub fn matches(&self, address: &Address) -> bool {
        self.vrf.is_none_or(|vrf| address.vrf_id == vrf)
            && self.block.is_none_or(|block| address.block_id == block)
            && self.status.is_none_or(|status| address.status == status)
            && self.address.is_none_or(|value| address.address == value)
    }
}

/// Selects VRFs, optionally by owning tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VrfFilter {
    pub tenant: Option<TenantId>,
}

impl VrfFilter {
    pub fn of_tenant(tenant: TenantId) -> Self {
        Self {
            tenant: Some(tenant),
        }
    }

    pub fn matches(&self, vrf: &Vrf) -> bool {
        self.tenant.is_none_or(|tenant| vrf.tenant_id == tenant)
    }
}
