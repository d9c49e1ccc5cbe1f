//! One hostname lookup and its full lifecycle.
//!
//! A [`ResolutionRequest`] is shared as an `Arc` between the handle that
//! created it, the pool that schedules it, and (only while it runs) the worker
//! thread executing it. The pool and the handle decide when it is disposed;
//! the worker merely borrows it for the duration of [`ResolutionRequest::run`].
//!
//! Cancellation is cooperative. [`ResolutionRequest::cancel`] trips the
//! request's [`CancellationToken`], and `run` inspects that token before every
//! attempt, after every backoff sleep, and right after the lookup primitive
//! returns. A cancelled run discards whatever it got and reports
//! [`NetError::ErrorHandled`], which the pool swallows.

use super::{Address, AddressList, Lookup, Name, RetryPolicy};
use crate::base::neterror::NetError;
use crate::base::requeststate::RequestState;
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
        Mutex, OnceLock, PoisonError,
    },
    thread,
};
use tokio_util::sync::CancellationToken;

/// Process-wide unique identifier of a [`ResolutionRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        RequestId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A pending, in-flight or finished hostname lookup.
pub struct ResolutionRequest {
    id: RequestId,
    hostname: Name,
    cancel: CancellationToken,
    state: Mutex<RequestState>,
    /// Set while the pool has handed this request to a worker thread.
    busy: AtomicBool,
    attempts: AtomicU32,
    /// Written once, by `run`; read-only afterwards.
    outcome: OnceLock<Result<AddressList, NetError>>,
}

impl ResolutionRequest {
    pub fn new(hostname: impl Into<Name>) -> Self {
        Self {
            id: RequestId::next(),
            hostname: hostname.into(),
            cancel: CancellationToken::new(),
            state: Mutex::new(RequestState::Idle),
            busy: AtomicBool::new(false),
            attempts: AtomicU32::new(0),
            outcome: OnceLock::new(),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn hostname(&self) -> &Name {
        &self.hostname
    }

    pub fn state(&self) -> RequestState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_state(&self, state: RequestState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// The token `run` checks at each resumption point.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Requests cancellation without waiting for a running lookup to notice.
    ///
    /// Returns false if the request had already completed, in which case its
    /// result stays readable.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == RequestState::Completed {
            return false;
        }
        self.cancel.cancel();
        *state = RequestState::Cancelled;
        true
    }

    /// Moves to `Running` unless cancelled in the meantime.
    pub(crate) fn mark_running(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if self.cancel.is_cancelled() {
            *state = RequestState::Cancelled;
            return false;
        }
        *state = RequestState::Running;
        true
    }

    /// Finalizes the request on the owning context.
    ///
    /// Returns false, leaving the request `Cancelled`, if cancellation won the
    /// race; the result must then not be reported.
    pub(crate) fn complete(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if self.cancel.is_cancelled() {
            *state = RequestState::Cancelled;
            return false;
        }
        *state = RequestState::Completed;
        true
    }

    /// True while a worker thread may be touching this request.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub(crate) fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Release);
    }

    /// Number of times the lookup primitive has been invoked.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Runs the blocking lookup with bounded retry on the calling thread.
    ///
    /// Transient failures are retried up to `retry.attempts()` times; "not
    /// found" and hard failures end the run immediately. Returns
    /// `Err(NetError::ErrorHandled)` if the request was cancelled, without
    /// recording any result.
    pub fn run(&self, lookup: &dyn Lookup, retry: &RetryPolicy) -> Result<AddressList, NetError> {
        if let Some(outcome) = self.outcome.get() {
            tracing::warn!(request = %self.id, "run called on a finished request");
            return outcome.clone();
        }

        let mut attempt = 0;
        let result = loop {
            attempt += 1;
            if self.is_cancelled() {
                return Err(self.abandon(attempt - 1));
            }

            let delay = retry.backoff(attempt);
            if !delay.is_zero() {
                thread::sleep(delay);
                if self.is_cancelled() {
                    return Err(self.abandon(attempt - 1));
                }
            }

            self.attempts.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(request = %self.id, host = %self.hostname, attempt, "lookup attempt");
            let outcome = lookup.lookup(&self.hostname);

            if self.is_cancelled() {
                // Result is dropped here, never surfaced.
                return Err(self.abandon(attempt));
            }

            match outcome {
                Ok(addrs) if addrs.is_empty() => break Err(NetError::HostNotFound),
                Ok(addrs) => break Ok(AddressList::from(addrs)),
                Err(e) if e.is_retryable() && retry.should_retry(attempt) => {
                    tracing::debug!(request = %self.id, host = %self.hostname, attempt, "transient lookup failure, retrying");
                }
                Err(e) => {
                    tracing::debug!(request = %self.id, host = %self.hostname, attempt, error = %e, "lookup failed");
                    break Err(e.net_error());
                }
            }
        };

        self.outcome.get_or_init(|| result).clone()
    }

    /// Records a failure for a run that ended abnormally.
    pub(crate) fn record_failure(&self, error: NetError) -> Result<AddressList, NetError> {
        self.outcome.get_or_init(|| Err(error)).clone()
    }

    fn abandon(&self, attempts: u32) -> NetError {
        tracing::debug!(request = %self.id, host = %self.hostname, attempts, "lookup abandoned after cancellation");
        NetError::ErrorHandled
    }

    /// The resolved addresses, once the request completed successfully.
    pub fn addresses(&self) -> Option<&AddressList> {
        match self.finished_outcome()? {
            Ok(list) => Some(list),
            Err(_) => None,
        }
    }

    /// The terminal error, once the request completed unsuccessfully.
    pub fn error(&self) -> Option<NetError> {
        self.finished_outcome()?.as_ref().err().copied()
    }

    /// Bounds-checked access to a resolved address.
    ///
    /// Fails with `OutOfRange` when `index` is past the end, and also when the
    /// request has not completed successfully (there are no addresses yet).
    pub fn address(&self, index: usize) -> Result<&Address, NetError> {
        self.addresses().ok_or(NetError::OutOfRange)?.get(index)
    }

    /// Number of resolved addresses; zero until completed successfully.
    pub fn address_count(&self) -> usize {
        self.addresses().map_or(0, AddressList::len)
    }

    fn finished_outcome(&self) -> Option<&Result<AddressList, NetError>> {
        if self.state() != RequestState::Completed {
            return None;
        }
        self.outcome.get()
    }
}

impl fmt::Debug for ResolutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionRequest")
            .field("id", &self.id)
            .field("hostname", &self.hostname)
            .field("state", &self.state())
            .field("busy", &self.is_busy())
            .field("attempts", &self.attempts())
            .finish()
    }
}
