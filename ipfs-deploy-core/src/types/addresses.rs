//! Node address sets and the public-address filter.
//!
//! Remote pinners are handed the local node's addresses as host hints so they
//! can dial it directly. Only publicly reachable addresses are useful there.

use std::net::{Ipv4Addr, Ipv6Addr};

use multiaddr::{Multiaddr, Protocol};
use serde::{Deserialize, Serialize};

/// Ordered multiaddrs advertised by the local node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAddressSet(Vec<String>);

impl NodeAddressSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the addresses in advertised order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Number of addresses.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set holds no addresses.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the addresses that are reachable from the public internet.
    ///
    /// Loopback, private, link-local and unspecified addresses are dropped;
    /// order is preserved. Never fails: an empty result just means providers
    /// fall back to network-wide discovery.
    pub fn public_only(&self) -> NodeAddressSet {
        NodeAddressSet(
            self.0
                .iter()
                .filter(|addr| is_public_multiaddr(addr))
                .cloned()
                .collect(),
        )
    }

    /// Consumes the set, returning the underlying vector.
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for NodeAddressSet {
    fn from(addrs: Vec<String>) -> Self {
        Self(addrs)
    }
}

impl IntoIterator for NodeAddressSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Returns true if `multiaddr` parses and its leading host is public.
///
/// Strings that are not valid multiaddrs are never public. Non-ip leading
/// components (`/dns4/...`, `/dnsaddr/...`) are kept: whether they resolve
/// publicly is the provider's problem.
pub fn is_public_multiaddr(multiaddr: &str) -> bool {
    let Ok(addr) = multiaddr.trim().parse::<Multiaddr>() else {
        return false;
    };

    match addr.iter().next() {
        Some(Protocol::Ip4(ip)) => is_public_v4(ip),
        Some(Protocol::Ip6(ip)) => is_public_v6(ip),
        // Zoned v6 addresses are link-scoped by definition.
        Some(Protocol::Ip6zone(_)) => false,
        Some(_) => true,
        None => false,
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    let shared = a == 100 && (64..128).contains(&b);

    !(ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || shared)
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_public_v4(v4);
    }

    let first = ip.segments()[0];
    let unique_local = (first & 0xfe00) == 0xfc00;
    let link_local = (first & 0xffc0) == 0xfe80;

    !(ip.is_loopback() || ip.is_unspecified() || unique_local || link_local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_filters_loopback_and_private() {
        let addrs = NodeAddressSet::from(vec![
            "/ip4/127.0.0.1/tcp/4001".to_string(),
            "/ip4/192.168.1.5/tcp/4001".to_string(),
            "/ip4/203.0.113.9/tcp/4001".to_string(),
        ]);

        assert_eq!(
            addrs.public_only().into_vec(),
            vec!["/ip4/203.0.113.9/tcp/4001".to_string()]
        );
    }

    #[test]
    fn test_preserves_order() {
        let addrs = NodeAddressSet::from(vec![
            "/ip4/198.51.100.7/udp/4001/quic-v1".to_string(),
            "/ip6/::1/tcp/4001".to_string(),
            "/ip4/203.0.113.9/tcp/4001/p2p/QmNnooDu7bfjPFoTZYxMNLWUQJyrVwtbZg5gBMjTezGAJN".to_string(),
        ]);

        assert_eq!(
            addrs.public_only().as_slice(),
            &[
                "/ip4/198.51.100.7/udp/4001/quic-v1".to_string(),
                "/ip4/203.0.113.9/tcp/4001/p2p/QmNnooDu7bfjPFoTZYxMNLWUQJyrVwtbZg5gBMjTezGAJN".to_string(),
            ]
        );
    }

    #[test]
    fn test_malformed_addresses_are_never_hints() {
        let addrs = NodeAddressSet::from(vec![
            "hello".to_string(),
            "/ip4/8.8.8.8/tcp/99999".to_string(),
            "/foo/bar".to_string(),
            "/ip4/8.8.8.8/tcp/4001".to_string(),
        ]);

        assert_eq!(addrs.public_only().into_vec(), vec!["/ip4/8.8.8.8/tcp/4001".to_string()]);
    }

    #[test]
    fn test_empty_result_is_valid() {
        let addrs = NodeAddressSet::from(vec!["/ip4/10.0.0.2/tcp/4001".to_string()]);
        assert!(addrs.public_only().is_empty());
        assert!(NodeAddressSet::new().public_only().is_empty());
    }

    #[test_case("/ip4/127.0.0.1/tcp/4001", false ; "v4 loopback")]
    #[test_case("/ip4/10.1.2.3/tcp/4001", false ; "v4 ten slash eight")]
    #[test_case("/ip4/172.20.0.1/tcp/4001", false ; "v4 172 sixteen")]
    #[test_case("/ip4/192.168.0.10/udp/4001/quic-v1", false ; "v4 192 168")]
    #[test_case("/ip4/169.254.3.4/tcp/4001", false ; "v4 link local")]
    #[test_case("/ip4/100.100.1.1/tcp/4001", false ; "v4 shared cgnat")]
    #[test_case("/ip4/0.0.0.0/tcp/4001", false ; "v4 unspecified")]
    #[test_case("/ip4/8.8.8.8/tcp/4001", true ; "v4 public")]
    #[test_case("/ip6/::1/tcp/4001", false ; "v6 loopback")]
    #[test_case("/ip6/::/tcp/4001", false ; "v6 unspecified")]
    #[test_case("/ip6/fd12:3456::1/tcp/4001", false ; "v6 unique local")]
    #[test_case("/ip6/fe80::1/tcp/4001", false ; "v6 link local")]
    #[test_case("/ip6/::ffff:192.168.1.1/tcp/4001", false ; "v6 mapped private")]
    #[test_case("/ip6/2001:db8::7/tcp/4001", true ; "v6 global")]
    #[test_case("/ip6zone/eth0/ip6/fe80::1/tcp/4001", false ; "v6 zoned")]
    #[test_case("/dns4/node.example.com/tcp/4001", true ; "dns name")]
    #[test_case("/ip4/not-an-ip/tcp/4001", false ; "malformed ip")]
    #[test_case("", false ; "empty")]
    #[test_case("hello", false ; "not a multiaddr")]
    #[test_case("/ip4/8.8.8.8/tcp/99999", false ; "port out of range")]
    #[test_case("/foo/bar", false ; "unknown protocol")]
    fn test_is_public_multiaddr(addr: &str, expected: bool) {
        assert_eq!(is_public_multiaddr(addr), expected);
    }
}
