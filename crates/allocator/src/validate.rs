//! Input validation shared by engine operations.

use std::net::IpAddr;

use subnetter_primitives::{Address, Block, Cidr, IpFamily, VrfId};

use crate::error::{Conflict, IpamError, IpamResult};

/// Longest tenant, VRF or route distinguisher name.
pub const MAX_NAME_LEN: usize = 128;

/// Longest free-text description or note.
pub const MAX_TEXT_LEN: usize = 512;

/// Trimmed, non-empty name of at most [`MAX_NAME_LEN`] characters.
pub(crate) fn name(field: &str, value: &str) -> IpamResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(IpamError::validation(format!("{field} must not be empty")));
    }
    bounded(field, value, MAX_NAME_LEN)
}

/// Free text of at most `max` characters. Empty is allowed.
pub(crate) fn bounded(field: &str, value: &str, max: usize) -> IpamResult<String> {
    if value.chars().count() > max {
        return Err(IpamError::validation(format!(
            "{field} is longer than {max} characters"
        )));
    }
    Ok(value.to_owned())
}

pub(crate) fn text(field: &str, value: Option<&str>) -> IpamResult<String> {
    bounded(field, value.unwrap_or_default(), MAX_TEXT_LEN)
}

/// A sub-block length for `parent`: between its own length and the family
/// width, inclusive.
pub(crate) fn prefix_len(parent: &Cidr, prefix_len: u8) -> IpamResult<()> {
    let bits = parent.family().bits();
    if prefix_len < parent.prefix_len() || prefix_len > bits {
        return Err(IpamError::validation(format!(
            "prefix length /{prefix_len} must be between /{} and /{bits} for {parent}",
            parent.prefix_len()
        )));
    }
    Ok(())
}

pub(crate) fn count(field: &str, count: u32, max: u32) -> IpamResult<()> {
    if count == 0 || count > max {
        return Err(IpamError::validation(format!(
            "{field} {count} must be between 1 and {max}"
        )));
    }
    Ok(())
}

/// A block registered under `parent` must share its VRF and family and lie
/// within it.
pub(crate) fn child_of(parent: &Block, vrf_id: VrfId, cidr: &Cidr) -> IpamResult<()> {
    if parent.vrf_id != vrf_id {
        return Err(IpamError::validation(format!(
            "parent block {} belongs to vrf {}, not {vrf_id}",
            parent.id, parent.vrf_id
        )));
    }
    if !parent.cidr.contains(cidr) {
        return Err(IpamError::validation(format!(
            "{cidr} is not within parent block {}",
            parent.cidr
        )));
    }
    Ok(())
}

/// `address` must lie inside `block` and must not appear in `existing`, the
/// addresses of the block's VRF with the same value.
pub(crate) fn address_in_block(block: &Block, address: &IpAddr, existing: &[Address]) -> IpamResult<()> {
    if IpFamily::of(address) != block.family() || !block.cidr.contains_addr(address) {
        return Err(IpamError::validation(format!(
            "{address} is not within block {}",
            block.cidr
        )));
    }
    if existing.iter().any(|a| a.address == *address) {
        return Err(Conflict::DuplicateAddress {
            address: *address,
            vrf_id: block.vrf_id,
        }
        .into());
    }
    Ok(())
}
