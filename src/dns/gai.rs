//! System lookup using getaddrinfo.
//!
//! This primitive uses the operating system's native name resolution via
//! `getaddrinfo`. It blocks the calling thread, which is why the resolver
//! only ever invokes it from its own worker threads.
//!
//! # When to Use
//!
//! - When you need to respect system DNS configuration (/etc/resolv.conf,
//!   /etc/hosts, nsswitch, etc.)
//! - When DoH/DoT is not required

use super::{Lookup, LookupError, Name};
use crate::base::context::IoResultExt;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

/// System lookup using `getaddrinfo`.
///
/// This wraps the standard library's `ToSocketAddrs` trait. IP literals are
/// answered directly without consulting the OS.
#[derive(Clone, Debug, Default)]
pub struct SystemLookup;

impl SystemLookup {
    /// Creates a new `SystemLookup`.
    pub fn new() -> Self {
        Self
    }
}

impl Lookup for SystemLookup {
    fn lookup(&self, name: &Name) -> Result<Vec<SocketAddr>, LookupError> {
        if let Some(addr) = try_parse_ip_literal(name.as_str()) {
            return Ok(vec![addr]);
        }

        let host = name.as_str();
        tracing::debug!(host = %host, "resolving via getaddrinfo");
        let addrs: Vec<SocketAddr> = (host, 0u16)
            .to_socket_addrs()
            .lookup_context(host)
            .map_err(|e| {
                tracing::debug!(host = %host, error = %e, "getaddrinfo failed");
                e
            })?
            .collect();

        tracing::debug!(host = %host, count = addrs.len(), "getaddrinfo complete");
        Ok(addrs)
    }
}

/// Attempts to parse a host string as an IP address.
///
/// Accepts bracketed IPv6 literals as they appear in URLs. Returns `None`
/// for anything that needs name resolution.
pub(crate) fn try_parse_ip_literal(host: &str) -> Option<SocketAddr> {
    let trimmed = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    trimmed
        .parse::<IpAddr>()
        .ok()
        .map(|ip| SocketAddr::new(ip, 0))
}
