//! Address-space allocation engine.
//!
//! [`Ipam`] manages IPv4 and IPv6 address space per VRF: it registers blocks
//! without letting claimed ranges overlap, carves parents into aligned
//! children, lists free space, and hands out host addresses. All state lives
//! behind a [`HierarchyStore`](subnetter_storage::HierarchyStore) handle.
//!
//! ```no_run
//! use subnetter_allocator::{CarveRequest, Ipam, NewBlock, NewVrf};
//! use subnetter_primitives::BlockStatus;
//! use subnetter_storage::MemoryStore;
//!
//! # fn main() -> Result<(), subnetter_allocator::IpamError> {
//! let ipam = Ipam::new(MemoryStore::new());
//! let tenant = ipam.create_tenant("acme")?;
//! let vrf = ipam.create_vrf(&NewVrf::new(tenant.id, "prod"))?;
//! let parent = ipam.register_block(&NewBlock::new(vrf.id, "10.0.0.0/24", BlockStatus::Container), None)?;
//! let children = ipam.carve(parent.id, &CarveRequest::first_fit(26, 2), None)?;
//! let host = ipam.next_address(children[0].id, None)?;
//! assert_eq!(host.address.to_string(), "10.0.0.1");
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
mod metrics;
mod overlap;
mod page;
mod validate;

pub mod hosts;
pub mod space;

pub use config::{
    AllocatorConfig, DEFAULT_MAX_CARVE_COUNT, DEFAULT_MAX_FREE_BLOCKS, DEFAULT_MAX_PAGE_LIMIT,
};
pub use engine::{
    AddressQuery, AddressUpdate, BlockQuery, BlockUpdate, CarveRequest, Ipam, NewAddress, NewBlock,
    NewVrf, TenantQuery, VrfQuery, VrfUpdate,
};
pub use error::{Conflict, ErrorKind, IpamError, IpamResult};
pub use page::{DEFAULT_PAGE_LIMIT, Page, Paged};
pub use validate::{MAX_NAME_LEN, MAX_TEXT_LEN};
