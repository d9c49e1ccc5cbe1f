//! Caller-facing resolution handle.
//!
//! A [`ResolverHandle`] is one logical "resolve this hostname" operation. It
//! owns at most one request at a time: resolving again, or dropping the
//! handle, cancels whatever is still outstanding so the pool never reports
//! into a stale or destroyed handle.

use super::{Address, AddressList, Name, ResolutionRequest, ResolverPool};
use crate::base::neterror::NetError;
use crate::base::requeststate::RequestState;
use std::{fmt, sync::Arc};

/// Receives the outcome of a [`ResolverHandle::resolve`] call.
///
/// Exactly one method is invoked per non-cancelled request, always on the
/// owning context (whoever drains the pool's completions). Cancelled requests
/// produce no callback at all.
pub trait ResolveListener: Send + Sync {
    /// `request.addresses()` is populated when this is called.
    fn on_resolved(&self, request: &ResolutionRequest);

    fn on_resolution_failed(&self, request: &ResolutionRequest, error: NetError);
}

/// Where the handle's current request stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleState {
    /// No request issued yet.
    #[default]
    Unused,
    Queued,
    Running,
    /// The listener has been (or is being) notified.
    Delivered,
    /// Cancelled by this handle, through `cancel`, a new `resolve`, or drop.
    CancelledByHandle,
    /// Cancelled from elsewhere, e.g. pool shutdown.
    CancelledExternally,
}

/// One hostname resolution owned by application code.
pub struct ResolverHandle {
    pool: ResolverPool,
    listener: Arc<dyn ResolveListener>,
    request: Option<Arc<ResolutionRequest>>,
    cancelled_by_handle: bool,
}

impl ResolverHandle {
    pub fn new(pool: &ResolverPool, listener: Arc<dyn ResolveListener>) -> Self {
        Self {
            pool: pool.clone(),
            listener,
            request: None,
            cancelled_by_handle: false,
        }
    }

    /// Starts resolving `hostname` on the pool.
    ///
    /// Any request this handle still has outstanding is cancelled first. An
    /// empty hostname fails with `HostNotFound` without touching the pool.
    pub fn resolve(&mut self, hostname: impl Into<Name>) -> Result<(), NetError> {
        let name = hostname.into();
        if name.is_empty() {
            return Err(NetError::HostNotFound);
        }
        self.cancel();

        let request = Arc::new(ResolutionRequest::new(name));
        self.cancelled_by_handle = false;
        match self
            .pool
            .submit(Arc::clone(&request), Arc::clone(&self.listener))
        {
            Ok(()) => {
                self.request = Some(request);
                Ok(())
            }
            Err(e) => {
                self.request = None;
                Err(e)
            }
        }
    }

    /// Resolves `hostname` on the calling thread, bypassing the pool.
    ///
    /// This blocks for as long as the lookup primitive takes, retries
    /// included. Do not call it from a thread that must stay responsive.
    /// The listener is not notified.
    pub fn resolve_synchronously(
        &mut self,
        hostname: impl Into<Name>,
    ) -> Result<AddressList, NetError> {
        let name = hostname.into();
        if name.is_empty() {
            return Err(NetError::HostNotFound);
        }
        self.cancel();

        let request = Arc::new(ResolutionRequest::new(name));
        self.cancelled_by_handle = false;
        self.request = Some(Arc::clone(&request));

        request.mark_running();
        let result = request.run(self.pool.lookup().as_ref(), &self.pool.config().retry);
        request.complete();
        result
    }

    /// Cancels the outstanding request, if any. No callback will follow.
    pub fn cancel(&mut self) {
        let Some(request) = &self.request else {
            return;
        };
        if request.state().is_terminal() {
            return;
        }
        if self.pool.cancel(request) {
            self.cancelled_by_handle = true;
        }
    }

    pub fn state(&self) -> HandleState {
        let Some(request) = &self.request else {
            return HandleState::Unused;
        };
        match request.state() {
            RequestState::Idle | RequestState::Queued => HandleState::Queued,
            RequestState::Running => HandleState::Running,
            RequestState::Completed => HandleState::Delivered,
            RequestState::Cancelled if self.cancelled_by_handle => HandleState::CancelledByHandle,
            RequestState::Cancelled => HandleState::CancelledExternally,
        }
    }

    /// The hostname of the current request.
    pub fn hostname(&self) -> Option<&Name> {
        self.request.as_deref().map(ResolutionRequest::hostname)
    }

    pub fn request(&self) -> Option<&Arc<ResolutionRequest>> {
        self.request.as_ref()
    }

    /// Resolved addresses; `None` until the listener was told of success.
    pub fn addresses(&self) -> Option<&AddressList> {
        self.request.as_deref()?.addresses()
    }

    pub fn address_count(&self) -> usize {
        self.addresses().map_or(0, AddressList::len)
    }

    /// Fails with `OutOfRange` past the end or before a successful delivery.
    pub fn address(&self, index: usize) -> Result<Address, NetError> {
        self.addresses()
            .ok_or(NetError::OutOfRange)?
            .get(index)
            .copied()
    }

    /// The terminal error of a failed request.
    pub fn error(&self) -> Option<NetError> {
        self.request.as_deref()?.error()
    }
}

impl Drop for ResolverHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for ResolverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverHandle")
            .field("hostname", &self.hostname())
            .field("state", &self.state())
            .finish()
    }
}
