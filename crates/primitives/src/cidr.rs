//! Address canonicalization.
//!
//! [`Cidr`] is the canonical form of a block: strict (no host bits set),
//! family-consistent, and printed in the shortest standard notation so that
//! two spellings of the same block compare and display identically.
//! [`parse_addr`] does the same for single host addresses.

use std::{fmt, net::IpAddr, str::FromStr};

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use crate::range::{AddrRange, IpFamily, addr_to_u128};

/// Errors raised while canonicalizing address text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddrParseError {
    /// Malformed or non-strict CIDR block.
    #[error("invalid CIDR {input:?}: {reason}")]
    InvalidCidr { input: String, reason: &'static str },
    /// Malformed host address.
    #[error("invalid IP address {input:?}")]
    InvalidAddress { input: String },
}

impl AddrParseError {
    /// The text that failed to parse, as supplied by the caller.
    pub fn input(&self) -> &str {
        match self {
            Self::InvalidCidr { input, .. } | Self::InvalidAddress { input } => input,
        }
    }
}

/// A canonical CIDR block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cidr(IpNet);

impl Cidr {
    /// Parse and canonicalize a CIDR block.
    ///
    /// A bare address is read as a single-address block (`/32` or `/128`).
    /// Surrounding whitespace is ignored and IPv4 octets may carry leading
    /// zeros, which are read as decimal.
    pub fn parse(input: &str) -> Result<Self, AddrParseError> {
        let invalid = |reason| AddrParseError::InvalidCidr {
            input: input.to_owned(),
            reason,
        };

        let text = input.trim();
        let (addr_text, len_text) = match text.split_once('/') {
            Some((addr, len)) => (addr, Some(len)),
            None => (text, None),
        };

        let addr = parse_ip(addr_text).ok_or_else(|| invalid("malformed address"))?;
        let width = IpFamily::of(&addr).bits();
        let prefix_len = match len_text {
            None => width,
            Some(len) => parse_prefix_len(len).ok_or_else(|| invalid("malformed prefix length"))?,
        };
        if prefix_len > width {
            return Err(invalid("prefix length out of range"));
        }

        let net = IpNet::new(addr, prefix_len).map_err(|_| invalid("prefix length out of range"))?;
        if net.trunc() != net {
            return Err(invalid("host bits set"));
        }
        Ok(Self(net))
    }

    /// The aligned block of `prefix_len` bits starting at `start`.
    ///
    /// Returns `None` if the prefix length exceeds the family width or
    /// `start` is not aligned to it.
    pub fn from_start(family: IpFamily, start: u128, prefix_len: u8) -> Option<Self> {
        if prefix_len > family.bits() || start & family.host_mask(prefix_len) != 0 {
            return None;
        }
        IpNet::new(family.addr_from_u128(start), prefix_len)
            .ok()
            .map(Self)
    }

    pub fn family(&self) -> IpFamily {
        match self.0 {
            IpNet::V4(_) => IpFamily::V4,
            IpNet::V6(_) => IpFamily::V6,
        }
    }

    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    /// First address of the block.
    pub fn network(&self) -> IpAddr {
        self.0.network()
    }

    /// Numeric interval covered by the block.
    pub fn range(&self) -> AddrRange {
        let family = self.family();
        let start = addr_to_u128(&self.0.network());
        AddrRange::new(family, start, start | family.host_mask(self.prefix_len()))
    }

    /// True when `addr` lies inside the block.
    pub fn contains_addr(&self, addr: &IpAddr) -> bool {
        self.0.contains(addr)
    }

    /// True when `other` lies entirely inside this block.
    pub fn contains(&self, other: &Cidr) -> bool {
        self.range().contains(&other.range())
    }

    pub fn overlaps(&self, other: &Cidr) -> bool {
        self.range().overlaps(&other.range())
    }

    pub fn as_ipnet(&self) -> &IpNet {
        &self.0
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Cidr {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Cidr {
    type Error = AddrParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Cidr> for String {
    fn from(value: Cidr) -> Self {
        value.to_string()
    }
}

/// Parse and canonicalize a single host address.
pub fn parse_addr(input: &str) -> Result<IpAddr, AddrParseError> {
    parse_ip(input.trim()).ok_or_else(|| AddrParseError::InvalidAddress {
        input: input.to_owned(),
    })
}

fn parse_ip(text: &str) -> Option<IpAddr> {
    text.parse::<IpAddr>()
        .ok()
        .or_else(|| parse_padded_v4(text).map(IpAddr::from))
}

/// Dotted quad whose octets may be zero-padded (`010.000.000.001`).
fn parse_padded_v4(text: &str) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut parts = text.split('.');
    for octet in &mut octets {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse::<u8>().ok()?;
    }
    parts.next().is_none().then_some(octets)
}

fn parse_prefix_len(text: &str) -> Option<u8> {
    if text.is_empty() || text.len() > 3 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    #[test]
    fn test_equivalent_spellings_canonicalize_identically() {
        let plain = Cidr::parse("10.0.0.0/24").unwrap();
        let padded = Cidr::parse("10.000.000.000/24").unwrap();
        let spaced = Cidr::parse("  10.0.0.0/24\n").unwrap();
        assert_eq!(plain, padded);
        assert_eq!(plain, spaced);
        assert_eq!(padded.to_string(), "10.0.0.0/24");

        let long = Cidr::parse("2001:0db8:0000:0000:0000:0000:0000:0000/32").unwrap();
        assert_eq!(long.to_string(), "2001:db8::/32");
    }

    #[test]
    fn test_bare_address_is_host_block() {
        assert_eq!(Cidr::parse("10.0.0.7").unwrap().to_string(), "10.0.0.7/32");
        assert_eq!(Cidr::parse("::1").unwrap().to_string(), "::1/128");
    }

    #[test]
    fn test_rejects_host_bits() {
        let err = Cidr::parse("10.0.0.1/24").unwrap_err();
        assert_matches!(err, AddrParseError::InvalidCidr { reason: "host bits set", .. });
        assert_eq!(err.input(), "10.0.0.1/24");
    }

    #[test]
    fn test_rejects_malformed() {
        for input in [
            "",
            "10.0.0/24",
            "10.0.0.0/33",
            "10.0.0.0/",
            "10.0.0.0/+8",
            "10.0.0.256/32",
            "2001:db8::/129",
            "banana",
            "10.0.0.0/24/1",
        ] {
            let err = Cidr::parse(input).unwrap_err();
            assert_eq!(err.input(), input);
        }
    }

    #[test]
    fn test_range() {
        let cidr = Cidr::parse("10.0.0.0/30").unwrap();
        let range = cidr.range();
        assert_eq!(range.family(), IpFamily::V4);
        assert_eq!(range.span(), 3);
        assert_eq!(range.first_addr().to_string(), "10.0.0.0");
        assert_eq!(range.last_addr().to_string(), "10.0.0.3");

        let all = Cidr::parse("::/0").unwrap().range();
        assert_eq!(all.start(), 0);
        assert_eq!(all.end(), u128::MAX);
    }

    #[test]
    fn test_from_start() {
        let cidr = Cidr::from_start(IpFamily::V4, 0x0a00_0040, 26).unwrap();
        assert_eq!(cidr.to_string(), "10.0.0.64/26");
        assert!(Cidr::from_start(IpFamily::V4, 0x0a00_0041, 26).is_none());
        assert!(Cidr::from_start(IpFamily::V4, 0, 33).is_none());
    }

    #[test]
    fn test_parse_addr() {
        assert_eq!(parse_addr(" 10.0.0.5 ").unwrap().to_string(), "10.0.0.5");
        assert_eq!(parse_addr("010.000.000.005").unwrap().to_string(), "10.0.0.5");
        assert_eq!(parse_addr("2001:DB8::0001").unwrap().to_string(), "2001:db8::1");
        assert_matches!(parse_addr("10.0.0.5/32"), Err(AddrParseError::InvalidAddress { .. }));
    }

    #[test]
    fn test_serde_uses_canonical_text() {
        let cidr = Cidr::parse("10.0.0.0/8").unwrap();
        let json = serde_json::to_string(&cidr).unwrap();
        assert_eq!(json, "\"10.0.0.0/8\"");
        let back: Cidr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cidr);
        assert!(serde_json::from_str::<Cidr>("\"10.0.0.1/8\"").is_err());
    }

    proptest! {
        #[test]
        fn canonicalize_is_idempotent_v4(bits in any::<u32>(), len in 0u8..=32) {
            let addr = std::net::Ipv4Addr::from_bits(bits);
            let net = IpNet::new(IpAddr::V4(addr), len).unwrap().trunc();
            let once = Cidr::parse(&net.to_string()).unwrap();
            let twice = Cidr::parse(&once.to_string()).unwrap();
            prop_assert_eq!(once, twice);
            prop_assert_eq!(once.to_string(), twice.to_string());
        }

        #[test]
        fn canonicalize_is_idempotent_v6(bits in any::<u128>(), len in 0u8..=128) {
            let addr = std::net::Ipv6Addr::from_bits(bits);
            let net = IpNet::new(IpAddr::V6(addr), len).unwrap().trunc();
            let once = Cidr::parse(&net.to_string()).unwrap();
            let twice = Cidr::parse(&once.to_string()).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn padded_octets_match_plain(octets in any::<[u8; 4]>(), len in 0u8..=32) {
            let net = IpNet::new(IpAddr::from(octets), len).unwrap().trunc();
            let IpAddr::V4(base) = net.network() else { unreachable!() };
            let [a, b, c, d] = base.octets();
            let padded = format!("{a:03}.{b:03}.{c:03}.{d:03}/{len}");
            prop_assert_eq!(Cidr::parse(&padded).unwrap(), Cidr::parse(&net.to_string()).unwrap());
        }
    }
}
