//! Numeric address intervals.
//!
//! Every address is mapped onto a `u128` so that IPv4 and IPv6 share the same
//! interval arithmetic. Ranges of different families never compare as
//! overlapping or containing each other.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

/// Address family of a block or address.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IpFamily {
    #[strum(serialize = "ipv4")]
    V4,
    #[strum(serialize = "ipv6")]
    V6,
}

impl IpFamily {
    /// Family of the given address.
    pub const fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }

    /// Address width in bits.
    pub const fn bits(self) -> u8 {
        match self {
            Self::V4 => 32,
            Self::V6 => 128,
        }
    }

    /// Mask covering the host part of a prefix of `prefix_len` bits.
    ///
    /// `prefix_len` is clamped to the family width.
    pub const fn host_mask(self, prefix_len: u8) -> u128 {
        let width = self.bits();
        let len = if prefix_len > width { width } else { prefix_len };
        let host_bits = (width - len) as u32;
        if host_bits >= u128::BITS {
            u128::MAX
        } else {
            (1u128 << host_bits) - 1
        }
    }

    /// Convert a numeric value back into an address of this family.
    ///
    /// IPv4 values are truncated to their low 32 bits.
    pub const fn addr_from_u128(self, value: u128) -> IpAddr {
        match self {
            Self::V4 => IpAddr::V4(Ipv4Addr::from_bits(value as u32)),
            Self::V6 => IpAddr::V6(Ipv6Addr::from_bits(value)),
        }
    }
}

/// Numeric value of an address.
pub const fn addr_to_u128(addr: &IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => v4.to_bits() as u128,
        IpAddr::V6(v6) => v6.to_bits(),
    }
}

/// An inclusive interval of addresses within one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddrRange {
    family: IpFamily,
    start: u128,
    end: u128,
}

impl AddrRange {
    /// Create a range from its first and last value.
    ///
    /// The bounds are swapped when given in the wrong order.
    pub const fn new(family: IpFamily, start: u128, end: u128) -> Self {
        if start <= end {
            Self { family, start, end }
        } else {
            Self {
                family,
                start: end,
                end: start,
            }
        }
    }

    /// Range holding exactly one address.
    pub const fn single(addr: &IpAddr) -> Self {
        let value = addr_to_u128(addr);
        Self::new(IpFamily::of(addr), value, value)
    }

    pub const fn family(&self) -> IpFamily {
        self.family
    }

    pub const fn start(&self) -> u128 {
        self.start
    }

    pub const fn end(&self) -> u128 {
        self.end
    }

    /// Number of addresses minus one. Saturates only for the full IPv6 space.
    pub const fn span(&self) -> u128 {
        self.end - self.start
    }

    /// True when the two intervals intersect.
    pub const fn overlaps(&self, other: &AddrRange) -> bool {
        same_family(self.family, other.family)
            && self.start <= other.end
            && other.start <= self.end
    }

    /// True when `other` lies entirely inside this range.
    pub const fn contains(&self, other: &AddrRange) -> bool {
        same_family(self.family, other.family)
            && self.start <= other.start
            && other.end <= self.end
    }

    /// True when the numeric value lies inside this range.
    pub const fn contains_value(&self, value: u128) -> bool {
        self.start <= value && value <= self.end
    }

    /// True when the address lies inside this range.
    pub const fn contains_addr(&self, addr: &IpAddr) -> bool {
        same_family(self.family, IpFamily::of(addr)) && self.contains_value(addr_to_u128(addr))
    }

    pub const fn first_addr(&self) -> IpAddr {
        self.family.addr_from_u128(self.start)
    }

    pub const fn last_addr(&self) -> IpAddr {
        self.family.addr_from_u128(self.end)
    }
}

// `PartialEq` is not const yet.
const fn same_family(a: IpFamily, b: IpFamily) -> bool {
    matches!(
        (a, b),
        (IpFamily::V4, IpFamily::V4) | (IpFamily::V6, IpFamily::V6)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4(start: u32, end: u32) -> AddrRange {
        AddrRange::new(IpFamily::V4, start as u128, end as u128)
    }

    #[test]
    fn test_overlap_is_interval_intersection() {
        assert!(v4(0, 255).overlaps(&v4(128, 255)));
        assert!(v4(0, 255).overlaps(&v4(255, 300)));
        assert!(!v4(0, 255).overlaps(&v4(256, 511)));
        assert!(v4(10, 20).overlaps(&v4(0, 100)));
    }

    #[test]
    fn test_families_never_overlap() {
        let v6 = AddrRange::new(IpFamily::V6, 0, 255);
        assert!(!v4(0, 255).overlaps(&v6));
        assert!(!v6.contains(&v4(0, 1)));
    }

    #[test]
    fn test_contains() {
        assert!(v4(0, 255).contains(&v4(64, 127)));
        assert!(v4(0, 255).contains(&v4(0, 255)));
        assert!(!v4(0, 255).contains(&v4(200, 256)));
    }

    #[test]
    fn test_host_mask() {
        assert_eq!(IpFamily::V4.host_mask(24), 0xff);
        assert_eq!(IpFamily::V4.host_mask(32), 0);
        assert_eq!(IpFamily::V4.host_mask(0), u32::MAX as u128);
        assert_eq!(IpFamily::V6.host_mask(0), u128::MAX);
        assert_eq!(IpFamily::V6.host_mask(64), u64::MAX as u128);
    }

    #[test]
    fn test_addr_conversion() {
        let addr: IpAddr = "10.0.0.1".parse().unwrap();
        let value = addr_to_u128(&addr);
        assert_eq!(value, 0x0a00_0001);
        assert_eq!(IpFamily::V4.addr_from_u128(value), addr);

        let addr: IpAddr = "2001:db8::1".parse().unwrap();
        assert_eq!(IpFamily::V6.addr_from_u128(addr_to_u128(&addr)), addr);
    }
}
