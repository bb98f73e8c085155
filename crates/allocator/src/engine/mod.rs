//! The allocation engine.

mod addresses;
mod blocks;
mod scopes;

use subnetter_primitives::{Address, AddressId, Block, BlockId, RecordKind, Tenant, TenantId, Vrf, VrfId};
use subnetter_storage::{HierarchyStore, StoreRead, StoreWrite};
use tracing::debug;

pub use addresses::{AddressQuery, AddressUpdate, NewAddress};
pub use blocks::{BlockQuery, BlockUpdate, CarveRequest, NewBlock};
pub use scopes::{NewVrf, TenantQuery, VrfQuery, VrfUpdate};

use crate::{
    config::AllocatorConfig,
    error::{Conflict, IpamError, IpamResult},
    metrics,
};

/// Address-space allocation engine over a [`HierarchyStore`].
///
/// The engine keeps no state of its own. Each mutating operation runs as a
/// single store write transaction that reads current state, validates the
/// request against it and writes the result, so two allocations racing for
/// the same space can never both commit. When the store reports a lost race
/// the operation is re-run once against fresh state before giving up with
/// [`Conflict::ConcurrentModification`].
#[derive(Debug, Clone)]
pub struct Ipam<S> {
    store: S,
    config: AllocatorConfig,
}

impl<S: HierarchyStore> Ipam<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, AllocatorConfig::default())
    }

    pub fn with_config(store: S, config: AllocatorConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    fn view<T>(&self, op: impl FnOnce(&dyn StoreRead) -> IpamResult<T>) -> IpamResult<T> {
        self.store.read(op)
    }

    /// Run `op` in a write transaction, once more on a store write conflict.
    fn transact<T>(
        &self,
        operation: &'static str,
        op: impl Fn(&mut dyn StoreWrite) -> IpamResult<T>,
    ) -> IpamResult<T> {
        let result = match self.store.write(&op) {
            Err(err) if err.is_write_conflict() => {
                debug!(operation, "write conflict, retrying against fresh state");
                metrics::store_retry(operation);
                match self.store.write(&op) {
                    Err(err) if err.is_write_conflict() => {
                        Err(Conflict::ConcurrentModification { operation }.into())
                    }
                    other => other,
                }
            }
            other => other,
        };
        if result.as_ref().is_err_and(IpamError::is_conflict) {
            metrics::conflict(operation);
        }
        result
    }
}

pub(crate) fn require_tenant<V: StoreRead + ?Sized>(view: &V, id: TenantId) -> IpamResult<Tenant> {
    view.tenant(id)?
        .ok_or_else(|| IpamError::not_found(RecordKind::Tenant, id))
}

pub(crate) fn require_vrf<V: StoreRead + ?Sized>(view: &V, id: VrfId) -> IpamResult<Vrf> {
    view.vrf(id)?
        .ok_or_else(|| IpamError::not_found(RecordKind::Vrf, id))
}

pub(crate) fn require_block<V: StoreRead + ?Sized>(view: &V, id: BlockId) -> IpamResult<Block> {
    view.block(id)?
        .ok_or_else(|| IpamError::not_found(RecordKind::Block, id))
}

pub(crate) fn require_address<V: StoreRead + ?Sized>(view: &V, id: AddressId) -> IpamResult<Address> {
    view.address(id)?
        .ok_or_else(|| IpamError::not_found(RecordKind::Address, id))
}
