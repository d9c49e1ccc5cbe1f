//! Core lookup types and traits.
//!
//! This module defines the `Lookup` trait: the opaque, blocking
//! name-to-address primitive that worker threads invoke. Everything about
//! how a name is actually resolved lives behind it.

use crate::base::neterror::NetError;
use std::{borrow::Cow, collections::HashMap, fmt, net::SocketAddr, sync::Arc};
use thiserror::Error;

/// A domain name to resolve into IP addresses.
///
/// This is a lightweight wrapper around a hostname string that provides
/// a type-safe way to pass domain names to lookup primitives.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    /// Creates a new [`Name`] from any string-like type.
    #[inline]
    pub fn new(host: impl Into<Box<str>>) -> Self {
        Self { host: host.into() }
    }

    /// View the hostname as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.host
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.host.is_empty()
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.host, f)
    }
}

/// Failure reported by a [`Lookup`] primitive.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Transient condition; the same query may succeed if repeated.
    #[error("temporary failure in name resolution")]
    TryAgain,
    /// The name does not resolve.
    #[error("name not found")]
    NotFound,
    /// Resource exhaustion or transport failure.
    #[error("name resolution failed: {0}")]
    Failed(String),
}

impl LookupError {
    /// Whether the request should be attempted again unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LookupError::TryAgain)
    }

    /// The terminal error surfaced when this failure is not (or no longer) retried.
    pub fn net_error(&self) -> NetError {
        match self {
            LookupError::NotFound => NetError::HostNotFound,
            LookupError::TryAgain | LookupError::Failed(_) => NetError::NetworkError,
        }
    }
}

/// Blocking name lookup, invoked only from resolver worker threads.
///
/// Implementations may block for as long as the underlying service takes;
/// the resolver never interrupts a call in progress. The returned addresses
/// may carry port 0, meaning "no port".
pub trait Lookup: Send + Sync {
    fn lookup(&self, name: &Name) -> Result<Vec<SocketAddr>, LookupError>;
}

/// Blanket implementation for Arc-wrapped lookups.
impl<L: Lookup + ?Sized> Lookup for Arc<L> {
    fn lookup(&self, name: &Name) -> Result<Vec<SocketAddr>, LookupError> {
        (**self).lookup(name)
    }
}

/// Lookup wrapper that supports hostname overrides.
///
/// This lookup first checks a map of hostname-to-address overrides before
/// falling back to the underlying primitive. Useful for:
/// - Testing without real DNS
/// - Forcing specific IPs for certain domains
/// - Local development with custom hostnames
///
/// # Example
///
/// ```rust,ignore
/// use hostresolver::dns::{LookupWithOverrides, SystemLookup};
/// use std::collections::HashMap;
///
/// let mut overrides = HashMap::new();
/// overrides.insert("api.local".into(), vec!["127.0.0.1:0".parse().unwrap()]);
///
/// let lookup = LookupWithOverrides::new(Arc::new(SystemLookup::new()), overrides);
/// ```
pub struct LookupWithOverrides {
    inner: Arc<dyn Lookup>,
    overrides: Arc<HashMap<Cow<'static, str>, Vec<SocketAddr>>>,
}

impl LookupWithOverrides {
    /// Creates a new lookup with the given overrides.
    ///
    /// # Arguments
    ///
    /// * `inner` - The fallback primitive for non-overridden hostnames.
    /// * `overrides` - Map of hostnames to their resolved addresses.
    pub fn new(
        inner: Arc<dyn Lookup>,
        overrides: HashMap<Cow<'static, str>, Vec<SocketAddr>>,
    ) -> Self {
        Self {
            inner,
            overrides: Arc::new(overrides),
        }
    }

    /// Returns the number of configured overrides.
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

impl Lookup for LookupWithOverrides {
    fn lookup(&self, name: &Name) -> Result<Vec<SocketAddr>, LookupError> {
        if let Some(addrs) = self.overrides.get(name.as_str()) {
            tracing::trace!(host = %name, "lookup served from overrides");
            return Ok(addrs.clone());
        }
        self.inner.lookup(name)
    }
}

impl fmt::Debug for LookupWithOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupWithOverrides")
            .field("override_count", &self.overrides.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_name_from_str() {
        let name = Name::from("example.com");
        assert_eq!(name.as_str(), "example.com");
        assert_eq!(name.to_string(), "example.com");
        assert!(!name.is_empty());
        assert!(Name::from("").is_empty());
    }

    #[test]
    fn test_name_equality() {
        assert_eq!(Name::new("example.com"), Name::from(String::from("example.com")));
        assert_ne!(Name::new("example.com"), Name::new("other.com"));
    }

    #[test]
    fn test_lookup_error_mapping() {
        assert_eq!(LookupError::NotFound.net_error(), NetError::HostNotFound);
        assert_eq!(LookupError::TryAgain.net_error(), NetError::NetworkError);
        assert_eq!(
            LookupError::Failed("socket".into()).net_error(),
            NetError::NetworkError
        );
        assert!(LookupError::TryAgain.is_retryable());
        assert!(!LookupError::NotFound.is_retryable());
    }

    struct MockLookup {
        response: Vec<SocketAddr>,
    }

    impl Lookup for MockLookup {
        fn lookup(&self, _name: &Name) -> Result<Vec<SocketAddr>, LookupError> {
            Ok(self.response.clone())
        }
    }

    #[test]
    fn test_override_lookup_hit() {
        let mock = Arc::new(MockLookup {
            response: vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 0)],
        });

        let mut overrides = HashMap::new();
        overrides.insert(
            Cow::Borrowed("override.local"),
            vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 0)],
        );

        let lookup = LookupWithOverrides::new(mock, overrides);
        assert_eq!(lookup.override_count(), 1);

        let addrs = lookup.lookup(&Name::new("override.local")).unwrap();
        assert_eq!(addrs.len(), 1);
        assert_eq!(addrs[0].ip(), IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
    }

    #[test]
    fn test_override_lookup_miss() {
        let mock = Arc::new(MockLookup {
            response: vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 0)],
        });

        let lookup = LookupWithOverrides::new(mock, HashMap::new());
        let addrs = lookup.lookup(&Name::new("not-overridden.com")).unwrap();

        assert_eq!(addrs.len(), 1);
        assert_eq!(addrs[0].ip(), IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)));
    }
}
