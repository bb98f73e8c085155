//! Host address selection inside a block.

use subnetter_primitives::{AddrRange, Cidr, IpFamily};

/// The addresses of `cidr` that may be handed out as hosts.
///
/// IPv4 blocks shorter than /31 exclude the network and broadcast
/// addresses. IPv6 blocks shorter than /127 exclude the subnet-router
/// anycast address (the network address). Point-to-point and host prefixes
/// (/31, /32, /127, /128) expose every address.
pub fn usable_hosts(cidr: &Cidr) -> AddrRange {
    let range = cidr.range();
    let host_bits = cidr.family().bits() - cidr.prefix_len();
    match (cidr.family(), host_bits) {
        (_, 0 | 1) => range,
        (IpFamily::V4, _) => AddrRange::new(IpFamily::V4, range.start() + 1, range.end() - 1),
        (IpFamily::V6, _) => AddrRange::new(IpFamily::V6, range.start() + 1, range.end()),
    }
}

/// Lowest value of `usable` missing from `taken`.
///
/// `taken` must be sorted ascending without duplicates; values outside
/// `usable` are ignored.
pub fn first_free(usable: &AddrRange, taken: &[u128]) -> Option<u128> {
    let mut candidate = usable.start();
    let from = taken.partition_point(|&v| v < candidate);
    for &value in taken.iter().skip(from) {
        if value != candidate {
            break;
        }
        candidate = candidate.checked_add(1)?;
    }
    usable.contains_value(candidate).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(s: &str) -> (String, String) {
        let usable = usable_hosts(&Cidr::parse(s).unwrap());
        (usable.first_addr().to_string(), usable.last_addr().to_string())
    }

    #[test]
    fn test_usable_hosts_ipv4() {
        assert_eq!(bounds("10.0.0.0/30"), ("10.0.0.1".into(), "10.0.0.2".into()));
        assert_eq!(bounds("10.0.0.0/24"), ("10.0.0.1".into(), "10.0.0.254".into()));
        assert_eq!(bounds("10.0.0.0/31"), ("10.0.0.0".into(), "10.0.0.1".into()));
        assert_eq!(bounds("10.0.0.7/32"), ("10.0.0.7".into(), "10.0.0.7".into()));
    }

    #[test]
    fn test_usable_hosts_ipv6() {
        assert_eq!(bounds("2001:db8::/126"), ("2001:db8::1".into(), "2001:db8::3".into()));
        assert_eq!(bounds("2001:db8::/127"), ("2001:db8::".into(), "2001:db8::1".into()));
        assert_eq!(bounds("2001:db8::5/128"), ("2001:db8::5".into(), "2001:db8::5".into()));
    }

    #[test]
    fn test_first_free() {
        let usable = usable_hosts(&Cidr::parse("10.0.0.0/29").unwrap());
        let base = usable.start();

        assert_eq!(first_free(&usable, &[]), Some(base));
        assert_eq!(first_free(&usable, &[base, base + 1]), Some(base + 2));
        // Holes are filled lowest first.
        assert_eq!(first_free(&usable, &[base, base + 2]), Some(base + 1));
        // Network address in the list does not shift the search.
        assert_eq!(first_free(&usable, &[base - 1, base]), Some(base + 1));
    }

    #[test]
    fn test_first_free_exhausted() {
        let usable = usable_hosts(&Cidr::parse("10.0.0.0/30").unwrap());
        let taken = [usable.start(), usable.end()];
        assert_eq!(first_free(&usable, &taken), None);

        let single = usable_hosts(&Cidr::parse("10.0.0.9/32").unwrap());
        assert_eq!(first_free(&single, &[single.start()]), None);
    }

    #[test]
    fn test_first_free_at_top_of_space() {
        let usable = usable_hosts(&Cidr::parse("ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff/128").unwrap());
        assert_eq!(first_free(&usable, &[u128::MAX]), None);
        assert_eq!(first_free(&usable, &[]), Some(u128::MAX));
    }
}
