//! Network interface statistics collector.
//!
//! Reads the cumulative per-interface counters from /proc/net/dev and joins
//! them with the IPv4/IPv6 addresses reported by `getifaddrs`. Counters are
//! shown as running totals, so no previous generation is kept.

use nix::ifaddrs::getifaddrs;
use nix::net::if_::InterfaceFlags;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::ReadError;

/// Number of counters per interface line (8 receive, 8 transmit).
pub const NETDEV_COUNTERS: usize = 16;

/// Column labels in /proc/net/dev order.
pub const NETDEV_LABELS: [&str; NETDEV_COUNTERS] = [
    "rx_bytes",
    "rx_packets",
    "rx_errs",
    "rx_drop",
    "rx_fifo",
    "rx_frame",
    "rx_compressed",
    "rx_multicast",
    "tx_bytes",
    "tx_packets",
    "tx_errs",
    "tx_drop",
    "tx_fifo",
    "tx_colls",
    "tx_carrier",
    "tx_compressed",
];

pub const RX_BYTES: usize = 0;
pub const RX_PACKETS: usize = 1;
pub const TX_BYTES: usize = 8;
pub const TX_PACKETS: usize = 9;

/// Counters of one interface in [`NETDEV_LABELS`] order.
pub type NetDevCounters = [u64; NETDEV_COUNTERS];

/// One address of one interface, with its device counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInterface {
    pub name: String,
    pub addr: String,
    pub is_ipv6: bool,
    pub is_up: bool,
    pub values: NetDevCounters,
}

/// Interface address as reported by `getifaddrs`, before counters are joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddr {
    pub name: String,
    pub addr: String,
    pub is_ipv6: bool,
    pub is_up: bool,
}

/// Parses /proc/net/dev: two header lines, then `name: 16 integers` per line.
///
/// Lines with fewer than 16 numeric counters are skipped.
pub fn parse_netdev(content: &str) -> Result<BTreeMap<String, NetDevCounters>, ReadError> {
    let mut lines = content.lines();
    if lines.next().is_none() || lines.next().is_none() {
        return Err(ReadError::malformed("/proc/net/dev", "missing header"));
    }

    let mut devices = BTreeMap::new();
    for line in lines {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        let mut values = [0u64; NETDEV_COUNTERS];
        let mut count = 0;
        for (slot, raw) in values.iter_mut().zip(rest.split_whitespace()) {
            match raw.parse() {
                Ok(v) => {
                    *slot = v;
                    count += 1;
                }
                Err(_) => break,
            }
        }
        if count < NETDEV_COUNTERS {
            debug!("Skipping malformed /proc/net/dev line for {}", name);
            continue;
        }

        devices.insert(name.to_string(), values);
    }

    Ok(devices)
}

/// Reads a /proc/net/dev-shaped file.
pub fn read_netdev(path: &Path) -> Result<BTreeMap<String, NetDevCounters>, ReadError> {
    let content = fs::read_to_string(path).map_err(|e| ReadError::unavailable(path, e))?;
    parse_netdev(&content)
}

/// Lists the IPv4 and IPv6 addresses of every interface.
pub fn list_interface_addresses() -> Result<Vec<InterfaceAddr>, ReadError> {
    let addrs = getifaddrs()
        .map_err(|e| ReadError::unavailable(Path::new("getifaddrs"), std::io::Error::from(e)))?;

    let mut out = Vec::new();
    for ifa in addrs {
        let Some(address) = ifa.address else {
            continue;
        };
        let (addr, is_ipv6) = if let Some(v4) = address.as_sockaddr_in() {
            (v4.ip().to_string(), false)
        } else if let Some(v6) = address.as_sockaddr_in6() {
            (v6.ip().to_string(), true)
        } else {
            continue;
        };

        out.push(InterfaceAddr {
            name: ifa.interface_name,
            addr,
            is_ipv6,
            is_up: ifa.flags.contains(InterfaceFlags::IFF_UP),
        });
    }
    Ok(out)
}

/// Attaches device counters to each address and sorts by interface name.
///
/// An address whose interface is missing from the counter table gets zeros.
pub fn join_interfaces(
    addrs: Vec<InterfaceAddr>,
    counters: &BTreeMap<String, NetDevCounters>,
) -> Vec<NetworkInterface> {
    let mut interfaces: Vec<NetworkInterface> = addrs
        .into_iter()
        .map(|a| NetworkInterface {
            values: counters.get(&a.name).copied().unwrap_or_default(),
            name: a.name,
            addr: a.addr,
            is_ipv6: a.is_ipv6,
            is_up: a.is_up,
        })
        .collect();

    // stable: keeps getifaddrs order between addresses of one interface
    interfaces.sort_by(|a, b| a.name.cmp(&b.name));
    interfaces
}

/// Rebuilds the interface list from scratch.
pub fn read_interfaces(netdev_path: &Path) -> Result<Vec<NetworkInterface>, ReadError> {
    let counters = read_netdev(netdev_path)?;
    Ok(join_interfaces(list_interface_addresses()?, &counters))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Inter-|   Receive                                                |  Transmit\n face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n";

    #[test]
    fn test_parse_netdev_sixteen_counters() {
        let content = format!(
            "{}  eth0: 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16\n",
            HEADER
        );
        let devices = parse_netdev(&content).unwrap();
        assert_eq!(devices.len(), 1);
        let expected: NetDevCounters = core::array::from_fn(|i| i as u64 + 1);
        assert_eq!(devices["eth0"], expected);
        assert_eq!(devices["eth0"][TX_BYTES], 9);
    }

    #[test]
    fn test_parse_netdev_no_space_after_colon() {
        let content = format!(
            "{}wlp3s0:123456 99 0 0 0 0 0 0 654321 88 0 0 0 0 0 0\n    lo:    10 1 0 0 0 0 0 0 10 1 0 0 0 0 0 0\n",
            HEADER
        );
        let devices = parse_netdev(&content).unwrap();
        assert_eq!(devices["wlp3s0"][RX_BYTES], 123456);
        assert_eq!(devices["wlp3s0"][TX_PACKETS], 88);
        assert_eq!(devices["lo"][RX_PACKETS], 1);
    }

    #[test]
    fn test_parse_netdev_skips_malformed_lines() {
        let content = format!(
            "{}  eth0: 1 2 3\n  eth1: 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 x\n",
            HEADER
        );
        let devices = parse_netdev(&content).unwrap();
        assert!(devices.is_empty());
    }

    #[test]
    fn test_parse_netdev_missing_header() {
        assert!(parse_netdev("only one line\n").is_err());
        assert!(parse_netdev("").is_err());
    }

    #[test]
    fn test_join_interfaces_sorted_with_counters() {
        let mut counters = BTreeMap::new();
        counters.insert("eth0".to_string(), [7u64; NETDEV_COUNTERS]);

        let addrs = vec![
            InterfaceAddr {
                name: "lo".into(),
                addr: "127.0.0.1".into(),
                is_ipv6: false,
                is_up: true,
            },
            InterfaceAddr {
                name: "eth0".into(),
                addr: "fe80::1".into(),
                is_ipv6: true,
                is_up: false,
            },
        ];

        let joined = join_interfaces(addrs, &counters);
        assert_eq!(joined[0].name, "eth0");
        assert_eq!(joined[0].values, [7u64; NETDEV_COUNTERS]);
        assert!(joined[0].is_ipv6);
        assert_eq!(joined[1].name, "lo");
        assert_eq!(joined[1].values, [0u64; NETDEV_COUNTERS]);
    }
}
