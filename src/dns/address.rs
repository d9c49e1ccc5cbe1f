//! Resolved addresses.
//!
//! An [`AddressList`] is built once, when a lookup succeeds, and is immutable
//! afterwards. Cloning it is cheap; all clones share one allocation.

use crate::base::neterror::NetError;
use std::{
    fmt,
    net::{IpAddr, SocketAddr},
    ops::Deref,
    sync::Arc,
};

/// Address family tag of a resolved [`Address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

/// A single resolved network address.
///
/// Resolvers that do not know a port leave it unset; callers pick the port
/// of the service they connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    ip: IpAddr,
    port: Option<u16>,
}

impl Address {
    /// Creates an address with no port.
    pub fn new(ip: IpAddr) -> Self {
        Self { ip, port: None }
    }

    /// Creates an address with a known port.
    pub fn with_port(ip: IpAddr, port: u16) -> Self {
        Self {
            ip,
            port: Some(port),
        }
    }

    pub fn family(&self) -> AddressFamily {
        match self.ip {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Raw address bytes in network order (4 for IPv4, 16 for IPv6).
    pub fn octets(&self) -> Vec<u8> {
        match self.ip {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        }
    }

    /// Builds a socket address, using `default_port` when no port is known.
    pub fn to_socket_addr(&self, default_port: u16) -> SocketAddr {
        SocketAddr::new(self.ip, self.port.unwrap_or(default_port))
    }
}

/// Port 0 is how `getaddrinfo` and hickory report "no port".
impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        match addr.port() {
            0 => Address::new(addr.ip()),
            port => Address::with_port(addr.ip(), port),
        }
    }
}

impl From<IpAddr> for Address {
    fn from(ip: IpAddr) -> Self {
        Address::new(ip)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => fmt::Display::fmt(&SocketAddr::new(self.ip, port), f),
            None => fmt::Display::fmt(&self.ip, f),
        }
    }
}

/// Ordered, immutable list of resolved addresses.
#[derive(Clone, PartialEq, Eq)]
pub struct AddressList {
    addrs: Arc<[Address]>,
}

impl AddressList {
    /// Creates a list from resolver output, preserving its order.
    pub fn new(addrs: impl IntoIterator<Item = Address>) -> Self {
        Self {
            addrs: addrs.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Bounds-checked indexed access.
    pub fn get(&self, index: usize) -> Result<&Address, NetError> {
        self.addrs.get(index).ok_or(NetError::OutOfRange)
    }

    pub fn first(&self) -> Option<&Address> {
        self.addrs.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Address> {
        self.addrs.iter()
    }
}

impl Deref for AddressList {
    type Target = [Address];

    fn deref(&self) -> &[Address] {
        &self.addrs
    }
}

impl From<Vec<SocketAddr>> for AddressList {
    fn from(addrs: Vec<SocketAddr>) -> Self {
        AddressList::new(addrs.into_iter().map(Address::from))
    }
}

impl<'a> IntoIterator for &'a AddressList {
    type Item = &'a Address;
    type IntoIter = std::slice::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.addrs.iter()
    }
}

impl fmt::Debug for AddressList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.addrs.iter()).finish()
    }
}
