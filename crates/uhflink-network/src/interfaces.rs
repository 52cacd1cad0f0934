//! Local interface enumeration and /24 subnet derivation.

use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr};

/// A /24 network identified by its first three octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subnet([u8; 3]);

impl Subnet {
    pub fn new(a: u8, b: u8, c: u8) -> Self {
        Self([a, b, c])
    }

    /// The subnet containing `ip`.
    pub fn of(ip: Ipv4Addr) -> Self {
        let [a, b, c, _] = ip.octets();
        Self([a, b, c])
    }

    pub fn host(&self, host: u8) -> Ipv4Addr {
        let [a, b, c] = self.0;
        Ipv4Addr::new(a, b, c, host)
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        match ip {
            IpAddr::V4(v4) => Self::of(v4) == *self,
            IpAddr::V6(_) => false,
        }
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a}.{b}.{c}.0/24")
    }
}

/// Source of the host's IPv4 addresses.
pub trait InterfaceSource: Send + Sync {
    fn ipv4_addresses(&self) -> io::Result<Vec<Ipv4Addr>>;
}

/// Interfaces of the running host, via `if-addrs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn ipv4_addresses(&self) -> io::Result<Vec<Ipv4Addr>> {
        let addrs = if_addrs::get_if_addrs()?
            .into_iter()
            .filter(|iface| !iface.is_loopback())
            .filter_map(|iface| match iface.ip() {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
            .collect();
        Ok(addrs)
    }
}

/// Fixed address list, for tests and hosts with a known layout.
#[derive(Debug, Clone, Default)]
pub struct StaticInterfaces(pub Vec<Ipv4Addr>);

impl InterfaceSource for StaticInterfaces {
    fn ipv4_addresses(&self) -> io::Result<Vec<Ipv4Addr>> {
        Ok(self.0.clone())
    }
}

/// Distinct /24 subnets of non-loopback addresses, in first-seen order.
///
/// ```
/// use std::net::Ipv4Addr;
/// use uhflink_network::{Subnet, subnets_of};
///
/// let subnets = subnets_of(&[
///     Ipv4Addr::new(192, 168, 1, 20),
///     Ipv4Addr::new(127, 0, 0, 1),
///     Ipv4Addr::new(192, 168, 1, 21),
///     Ipv4Addr::new(10, 0, 0, 5),
/// ]);
/// assert_eq!(subnets, vec![Subnet::new(192, 168, 1), Subnet::new(10, 0, 0)]);
/// ```
pub fn subnets_of(addrs: &[Ipv4Addr]) -> Vec<Subnet> {
    let mut subnets: Vec<Subnet> = Vec::new();
    for addr in addrs.iter().filter(|addr| !addr.is_loopback()) {
        let subnet = Subnet::of(*addr);
        if !subnets.contains(&subnet) {
            subnets.push(subnet);
        }
    }
    subnets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subnet_host_and_display() {
        let subnet = Subnet::of(Ipv4Addr::new(192, 168, 1, 155));
        assert_eq!(subnet.host(7), Ipv4Addr::new(192, 168, 1, 7));
        assert_eq!(subnet.to_string(), "192.168.1.0/24");
    }

    #[test]
    fn test_subnet_contains() {
        let subnet = Subnet::new(10, 0, 0);
        assert!(subnet.contains("10.0.0.200".parse().unwrap()));
        assert!(!subnet.contains("10.0.1.200".parse().unwrap()));
        assert!(!subnet.contains("::1".parse().unwrap()));
    }

    #[test]
    fn test_subnets_skip_loopback_only() {
        assert!(subnets_of(&[Ipv4Addr::LOCALHOST]).is_empty());
    }
}
