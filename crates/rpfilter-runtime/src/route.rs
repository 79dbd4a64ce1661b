//! Route descriptor
//!
//! The candidate a filter is evaluated against: a prefix, its origin AS
//! and AS path, a concrete address family, and the optional originating
//! router identity supplied by peering evaluation.

use rpfilter_core::{Afi, AsPath, Asn, MpPrefix};
use std::net::IpAddr;

/// A candidate route under evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteInfo {
    /// Announced prefix
    pub prefix: MpPrefix,
    /// Originating AS
    pub origin: Asn,
    /// AS path, nearest hop first, origin last
    pub as_path: AsPath,
    /// Concrete address family of the announcement
    pub afi: Afi,
    /// Originating router address, when known
    pub router: Option<IpAddr>,
    /// Originating router DNS name, when known
    pub router_name: Option<String>,
}

impl RouteInfo {
    /// Create a route descriptor; the address family defaults to the
    /// prefix's family, unicast
    pub fn new(prefix: MpPrefix, origin: Asn) -> Self {
        let afi = if prefix.is_ipv4() {
            Afi::Ipv4Unicast
        } else {
            Afi::Ipv6Unicast
        };
        RouteInfo {
            prefix,
            origin,
            as_path: AsPath::default(),
            afi,
            router: None,
            router_name: None,
        }
    }

    /// Set the AS path
    pub fn with_as_path(mut self, as_path: AsPath) -> Self {
        self.as_path = as_path;
        self
    }

    /// Override the concrete address family (e.g. multicast)
    pub fn with_afi(mut self, afi: Afi) -> Self {
        self.afi = afi;
        self
    }

    /// Set the originating router address
    pub fn with_router(mut self, addr: IpAddr) -> Self {
        self.router = Some(addr);
        self
    }

    /// Set the originating router name
    pub fn with_router_name(mut self, name: impl Into<String>) -> Self {
        self.router_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_afi_defaults_to_prefix_family() {
        let v4 = RouteInfo::new("10.0.0.0/8".parse().unwrap(), 64500);
        assert_eq!(v4.afi, Afi::Ipv4Unicast);

        let v6 = RouteInfo::new("2001:db8::/32".parse().unwrap(), 64500);
        assert_eq!(v6.afi, Afi::Ipv6Unicast);
    }

    #[test]
    fn test_builders() {
        let route = RouteInfo::new("10.0.0.0/8".parse().unwrap(), 64502)
            .with_as_path(AsPath::new(vec![64500, 64501, 64502]))
            .with_afi(Afi::Ipv4Multicast)
            .with_router("192.0.2.1".parse().unwrap())
            .with_router_name("edge1.example.net");
        assert_eq!(route.as_path.origin(), Some(64502));
        assert_eq!(route.afi, Afi::Ipv4Multicast);
        assert!(route.router.is_some());
    }
}
