//! Addressing and positioning types.

use std::{fmt, net::Ipv4Addr};

/// An opaque identifier for the network device a route leaves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev{}", self.0)
    }
}

/// An IPv4 address assigned to a local interface, along with its network mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceAddress {
    local: Ipv4Addr,
    mask: Ipv4Addr,
}

impl InterfaceAddress {
    /// Creates a new interface address from the local address and the network mask.
    pub fn new(local: Ipv4Addr, mask: Ipv4Addr) -> Self {
        Self { local, mask }
    }

    /// Returns the local address of the interface.
    pub fn local(&self) -> Ipv4Addr {
        self.local
    }

    /// Returns the network mask of the interface.
    pub fn mask(&self) -> Ipv4Addr {
        self.mask
    }

    /// Returns the subnet-directed broadcast address for this interface.
    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.local) | !u32::from(self.mask))
    }
}

impl fmt::Display for InterfaceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local)
    }
}

/// A node's position on the simulation plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    /// Creates a new position.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Computes the euclidean distance between two positions.
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);

        dx.hypot(dy)
    }
}

/// Returns `true` if the address is a subnet-directed broadcast address under the supplied
/// mask, i.e. all of its host bits are set.
///
/// A host-route mask (`/32`) has no host bits and therefore never matches.
pub fn is_subnet_directed_broadcast(addr: Ipv4Addr, mask: Ipv4Addr) -> bool {
    let host_bits = !u32::from(mask);
    host_bits != 0 && u32::from(addr) & host_bits == host_bits
}

/// Returns `true` if the address can stand for a single neighbor, i.e. it isn't the limited
/// broadcast, a loopback, a multicast or a subnet-directed broadcast address.
///
/// The whole of `127.0.0.0/8` counts as loopback, not only `127.0.0.1`.
pub fn is_unicast_destination(addr: Ipv4Addr, mask: Ipv4Addr) -> bool {
    !(addr.is_broadcast()
        || addr.is_loopback()
        || addr.is_multicast()
        || is_subnet_directed_broadcast(addr, mask))
}
