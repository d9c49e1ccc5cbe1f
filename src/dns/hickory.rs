//! Lookup primitive backed by hickory-dns.
//!
//! hickory is an async resolver; worker threads are plain OS threads, so this
//! primitive owns a small private tokio runtime and blocks on it for each
//! query. That keeps the blocking-call contract of [`Lookup`] while gaining:
//! - DNS-over-HTTPS (DoH) / DNS-over-TLS (DoT) capable transports
//! - System DNS configuration auto-detection
//! - IPv4 + IPv6 dual-stack lookups
//!
//! Called from inside another tokio runtime (for example through
//! `ResolverHandle::resolve_synchronously` on an async task), a lookup fails
//! with [`LookupError::Failed`] instead of nesting `block_on`.

use super::{Lookup, LookupError, Name};
use hickory_resolver::{
    config::{LookupIpStrategy, ResolverConfig},
    name_server::TokioConnectionProvider,
    TokioResolver,
};
use std::{fmt, io, net::SocketAddr};
use tokio::runtime::{Builder, Runtime};

/// Blocking lookup backed by hickory-dns.
///
/// # Example
///
/// ```rust,ignore
/// use hostresolver::dns::{HickoryLookup, ResolverPool};
///
/// let pool = ResolverPool::new(HickoryLookup::new()?);
/// ```
pub struct HickoryLookup {
    // Always Some until drop.
    runtime: Option<Runtime>,
    resolver: TokioResolver,
}

impl HickoryLookup {
    /// Creates a new `HickoryLookup`.
    ///
    /// It will attempt to read system DNS configuration; if that fails,
    /// it falls back to sensible defaults.
    pub fn new() -> io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("host-resolver-hickory")
            .enable_all()
            .build()?;

        let resolver = {
            let _guard = runtime.enter();
            let mut builder = match TokioResolver::builder_tokio() {
                Ok(builder) => {
                    tracing::debug!("Using system DNS configuration");
                    builder
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to read system DNS config, using defaults"
                    );
                    TokioResolver::builder_with_config(
                        ResolverConfig::default(),
                        TokioConnectionProvider::default(),
                    )
                }
            };

            // Enable dual-stack
            builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4AndIpv6;

            builder.build()
        };

        Ok(Self {
            runtime: Some(runtime),
            resolver,
        })
    }
}

impl Lookup for HickoryLookup {
    fn lookup(&self, name: &Name) -> Result<Vec<SocketAddr>, LookupError> {
        let domain = name.as_str();
        tracing::debug!(domain = %domain, "resolving via hickory-dns");

        if tokio::runtime::Handle::try_current().is_ok() {
            tracing::warn!(domain = %domain, "hickory-dns lookup called from inside a tokio runtime");
            return Err(LookupError::Failed(
                "called from inside a tokio runtime".into(),
            ));
        }
        let Some(runtime) = &self.runtime else {
            return Err(LookupError::Failed("hickory runtime stopped".into()));
        };
        let lookup = runtime
            .block_on(self.resolver.lookup_ip(domain))
            .map_err(|e| {
                tracing::debug!(domain = %domain, error = %e, "hickory-dns lookup failed");
                if e.is_nx_domain() || e.is_no_records_found() {
                    LookupError::NotFound
                } else {
                    LookupError::Failed(e.to_string())
                }
            })?;

        let addrs: Vec<SocketAddr> = lookup.iter().map(|ip| SocketAddr::new(ip, 0)).collect();
        tracing::debug!(domain = %domain, count = addrs.len(), "hickory-dns resolution complete");
        Ok(addrs)
    }
}

impl Drop for HickoryLookup {
    fn drop(&mut self) {
        // A plain drop blocks, which panics inside an async context.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl fmt::Debug for HickoryLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HickoryLookup").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hickory_lookup_builds() {
        assert!(HickoryLookup::new().is_ok());
    }

    #[test]
    fn test_hickory_lookup_invalid_domain() {
        let lookup = HickoryLookup::new().expect("runtime");
        let result = lookup.lookup(&Name::new("this-domain-definitely-does-not-exist.invalid"));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_lookup_inside_runtime_fails_without_panicking() {
        let lookup = HickoryLookup::new().expect("runtime");
        let err = lookup.lookup(&Name::new("localhost")).unwrap_err();
        assert!(matches!(err, LookupError::Failed(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_resolve_synchronously_on_async_task_returns_error() {
        use crate::base::neterror::NetError;
        use crate::dns::{ResolutionRequest, ResolveListener, ResolverHandle, ResolverPool};
        use std::sync::Arc;

        struct NoopListener;

        impl ResolveListener for NoopListener {
            fn on_resolved(&self, _request: &ResolutionRequest) {}
            fn on_resolution_failed(&self, _request: &ResolutionRequest, _error: NetError) {}
        }

        let pool = ResolverPool::new(HickoryLookup::new().expect("runtime"));
        let mut handle = ResolverHandle::new(&pool, Arc::new(NoopListener));

        let err = handle.resolve_synchronously("localhost").unwrap_err();
        assert_eq!(err, NetError::NetworkError);
        assert_eq!(handle.error(), Some(NetError::NetworkError));
    }
}
