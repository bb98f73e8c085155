//! Common types for hierarchical IPv4/IPv6 address management.
//!
//! - [`cidr`] - Canonical CIDR blocks and host addresses
//! - [`range`] - Numeric address intervals shared by both families
//! - [`ids`] - Typed record identifiers
//! - [`record`] - Tenant, VRF, block and address records

pub mod cidr;
pub mod ids;
pub mod range;
pub mod record;
mod status;

pub use cidr::{AddrParseError, Cidr, parse_addr};
pub use ids::{AddressId, BlockId, TenantId, VrfId};
pub use range::{AddrRange, IpFamily, addr_to_u128};
pub use record::{Address, Block, RecordKind, Tenant, Vrf};
pub use status::{AddressStatus, BlockStatus, CarveStrategy};
