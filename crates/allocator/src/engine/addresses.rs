//! Host address assignment.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use subnetter_primitives::{
    Address, AddressId, AddressStatus, BlockId, IpFamily, VrfId, addr_to_u128, parse_addr,
};
use subnetter_storage::{AddressFilter, HierarchyStore};
use tracing::{debug, info, instrument};

use super::{Ipam, require_address, require_block, require_vrf};
use crate::{
    error::{Conflict, IpamError, IpamResult},
    hosts, metrics,
    page::{Page, Paged},
    validate,
};

/// Request to register a specific address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
    pub vrf_id: VrfId,
    pub block_id: BlockId,
    /// Address text; canonicalised on registration.
    pub address: String,
    #[serde(default)]
    pub status: AddressStatus,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewAddress {
    pub fn new(vrf_id: VrfId, block_id: BlockId, address: impl Into<String>) -> Self {
        Self {
            vrf_id,
            block_id,
            address: address.into(),
            status: AddressStatus::Active,
            note: None,
        }
    }

    pub fn with_status(mut self, status: AddressStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Fields of an address that may change. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressUpdate {
    pub status: Option<AddressStatus>,
    pub note: Option<String>,
}

/// Address listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressQuery {
    pub vrf: Option<VrfId>,
    pub block: Option<BlockId>,
    pub status: Option<AddressStatus>,
    /// Address text; canonicalised before matching.
    pub address: Option<String>,
}

impl<S: HierarchyStore> Ipam<S> {
    /// Assign the lowest usable address of a block that nothing in the
    /// block's VRF holds yet.
    #[instrument(skip(self))]
    pub fn next_address(&self, block_id: BlockId, idempotency_key: Option<&str>) -> IpamResult<Address> {
        let address = self.transact("next_address", |txn| {
            let block = require_block(&*txn, block_id)?;
            let usable = hosts::usable_hosts(&block.cidr);

            let mut taken: Vec<u128> = txn
                .addresses(&AddressFilter::in_vrf(block.vrf_id))?
                .iter()
                .filter(|a| IpFamily::of(&a.address) == block.family())
                .map(|a| addr_to_u128(&a.address))
                .filter(|&value| usable.contains_value(value))
                .collect();
            taken.sort_unstable();
            taken.dedup();

            let value = hosts::first_free(&usable, &taken)
                .ok_or(Conflict::AddressesExhausted { block: block.cidr })?;
            let address = Address {
                id: AddressId::random(),
                vrf_id: block.vrf_id,
                block_id: block.id,
                address: block.family().addr_from_u128(value),
                status: AddressStatus::Active,
                note: String::new(),
                created_at: Utc::now(),
            };
            txn.insert_address(&address)?;
            Ok(address)
        })?;

        metrics::address_allocated("next");
        info!(address = %address.address, id = %address.id, "allocated next address");
        Ok(address)
    }

    /// Register a caller-chosen address inside a block.
    #[instrument(skip(self, request), fields(vrf = %request.vrf_id, block = %request.block_id))]
    pub fn register_address(&self, request: &NewAddress) -> IpamResult<Address> {
        let value = parse_addr(&request.address)?;
        let note = validate::text("note", request.note.as_deref())?;

        let address = self.transact("register_address", |txn| {
            require_vrf(&*txn, request.vrf_id)?;
            let block = require_block(&*txn, request.block_id)?;
            if block.vrf_id != request.vrf_id {
                return Err(IpamError::validation(format!(
                    "block {} belongs to vrf {}, not {}",
                    block.id, block.vrf_id, request.vrf_id
                )));
            }

            let existing = txn.addresses(&AddressFilter::in_vrf(request.vrf_id).with_address(value))?;
            validate::address_in_block(&block, &value, &existing)?;

            let address = Address {
                id: AddressId::random(),
                vrf_id: request.vrf_id,
                block_id: block.id,
                address: value,
                status: request.status,
                note: note.clone(),
                created_at: Utc::now(),
            };
            txn.insert_address(&address)?;
            Ok(address)
        })?;

        metrics::address_allocated("register");
        info!(address = %address.address, id = %address.id, "registered address");
        Ok(address)
    }

    pub fn get_address(&self, id: AddressId) -> IpamResult<Address> {
        self.view(|view| require_address(view, id))
    }

    pub fn list_addresses(&self, query: &AddressQuery, page: Page) -> IpamResult<Paged<Address>> {
        let address = query.address.as_deref().map(parse_addr).transpose()?;
        let filter = AddressFilter {
            vrf: query.vrf,
            block: query.block,
            status: query.status,
            address,
        };
        let addresses = self.view(|view| Ok(view.addresses(&filter)?))?;
        page.apply(addresses, self.config.max_page_limit)
    }

    #[instrument(skip(self, update))]
    pub fn update_address(&self, id: AddressId, update: &AddressUpdate) -> IpamResult<Address> {
        let note = update
            .note
            .as_deref()
            .map(|n| validate::text("note", Some(n)))
            .transpose()?;

        self.transact("update_address", |txn| {
            let mut address = require_address(&*txn, id)?;
            if let Some(status) = update.status {
                address.status = status;
            }
            if let Some(note) = &note {
                address.note.clone_from(note);
            }
            txn.update_address(&address)?;
            Ok(address)
        })
    }

    /// Release an address. Deleting a missing address is a no-op.
    #[instrument(skip(self))]
    pub fn delete_address(&self, id: AddressId) -> IpamResult<()> {
        self.transact("delete_address", |txn| {
            if txn.address(id)?.is_none() {
                debug!("address already absent");
                return Ok(());
            }
            txn.delete_address(id)?;
            Ok(())
        })
    }
}
