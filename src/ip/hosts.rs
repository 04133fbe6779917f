//! Host range helpers for IPv4 networks.

use ipnetwork::Ipv4Network;
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

/// Usable host range of a network as integers.
///
/// Network and broadcast addresses are excluded, except for /31 (both
/// addresses usable) and /32 (the single address).
fn host_range(network: Ipv4Network) -> RangeInclusive<u32> {
    let first = u32::from(network.network());
    let last = u32::from(network.broadcast());
    if network.prefix() >= 31 {
        first..=last
    } else {
        first + 1..=last - 1
    }
}

/// Iterate the usable hosts of a network in ascending order
pub fn usable_hosts(network: Ipv4Network) -> impl Iterator<Item = Ipv4Addr> {
    host_range(network).map(Ipv4Addr::from)
}

/// Number of usable hosts in a network
pub fn host_count(network: Ipv4Network) -> u64 {
    let range = host_range(network);
    u64::from(*range.end()) - u64::from(*range.start()) + 1
}

/// Check if an address is a usable host of the network
pub fn is_usable_host(network: Ipv4Network, address: Ipv4Addr) -> bool {
    host_range(network).contains(&u32::from(address))
}
