//! Bounded pool of resolver threads.
//!
//! The pool owns a FIFO queue of [`ResolutionRequest`]s and a lazily grown set
//! of [`WorkerThread`]s, both behind one coarse lock. All bookkeeping (enqueue,
//! dequeue, assignment, completion) happens under that lock on the owning
//! context. Worker threads only ever talk back through the completion channel,
//! which the owning context drains with [`ResolverPool::process_completions`],
//! [`ResolverPool::next_completion`] or [`ResolverPool::run_until_idle`].
//!
//! Listener callbacks are always invoked with the lock released, so a
//! listener may submit, cancel or drop handles freely.

use super::worker::{Completion, WorkerId, WorkerThread};
use super::{HostResolverConfig, Lookup, RequestId, ResolutionRequest, ResolveListener};
use crate::base::neterror::NetError;
use crate::base::requeststate::RequestState;
use std::{
    collections::{HashMap, VecDeque},
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::{mpsc, Mutex as AsyncMutex};

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Worker threads spawned so far.
    pub threads: usize,
    /// Worker threads currently serving a request.
    pub busy_threads: usize,
    /// Requests waiting for a free thread.
    pub queued: usize,
}

/// A request the pool is responsible for, queued or running.
struct PendingResolution {
    request: Arc<ResolutionRequest>,
    listener: Arc<dyn ResolveListener>,
}

/// Everything behind the pool lock.
struct PoolState {
    active: bool,
    queue: VecDeque<RequestId>,
    requests: HashMap<RequestId, PendingResolution>,
    workers: Vec<WorkerThread>,
    next_worker_id: WorkerId,
    /// Cloned into each new worker; dropped at shutdown.
    completions: Option<mpsc::Sender<Completion>>,
}

impl PoolState {
    fn has_pending_work(&self) -> bool {
        !self.queue.is_empty() || self.workers.iter().any(|w| w.current().is_some())
    }
}

struct PoolInner {
    config: HostResolverConfig,
    lookup: Arc<dyn Lookup>,
    state: Mutex<PoolState>,
    receiver: AsyncMutex<mpsc::Receiver<Completion>>,
}

/// Requests removed from the pool; dropped only after the lock is released.
type Disposed = Vec<PendingResolution>;

impl PoolInner {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawns one more worker if the configured maximum allows it.
    fn grow(&self, state: &mut PoolState) -> bool {
        if state.workers.len() >= self.config.max_threads {
            return false;
        }
        let Some(completions) = state.completions.clone() else {
            return false;
        };

        let id = state.next_worker_id;
        match WorkerThread::spawn(id, &self.config, Arc::clone(&self.lookup), completions) {
            Ok(worker) => {
                state.next_worker_id += 1;
                state.workers.push(worker);
                true
            }
            Err(e) if state.workers.is_empty() => {
                tracing::error!(error = %e, "failed to spawn any resolver thread");
                false
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    threads = state.workers.len(),
                    "failed to spawn resolver thread, continuing with fewer threads"
                );
                false
            }
        }
    }

    /// Drops workers whose thread is gone so `grow` can replace them.
    ///
    /// A worker still holding an assignment is kept until its completion is
    /// finalized.
    fn prune_exited(&self, state: &mut PoolState) {
        state.workers.retain(|worker| {
            if worker.current().is_none() && worker.has_exited() {
                tracing::warn!(worker = worker.id(), "resolver thread exited unexpectedly, replacing");
                false
            } else {
                true
            }
        });
    }

    /// Whether a request submitted now would start without waiting.
    fn can_start_now(&self, state: &PoolState) -> bool {
        state.queue.is_empty()
            && (state.workers.iter().any(WorkerThread::is_idle)
                || state.workers.len() < self.config.max_threads)
    }

    /// Matches queued requests to idle workers in FIFO order.
    fn dispatch_locked(&self, state: &mut PoolState, disposed: &mut Disposed) {
        self.prune_exited(state);
        while let Some(id) = state.queue.pop_front() {
            let Some(entry) = state.requests.get(&id) else {
                continue;
            };
            let request = Arc::clone(&entry.request);

            if request.is_cancelled() {
                tracing::trace!(request = %id, "dropping cancelled request from queue");
                disposed.extend(state.requests.remove(&id));
                continue;
            }

            let slot = match state.workers.iter().position(WorkerThread::is_idle) {
                Some(slot) => Some(slot),
                None if self.grow(state) => Some(state.workers.len() - 1),
                None => None,
            };
            let Some(slot) = slot else {
                // Every thread is busy; wait for the next completion.
                state.queue.push_front(id);
                break;
            };

            request.set_busy(true);
            if !request.mark_running() {
                request.set_busy(false);
                disposed.extend(state.requests.remove(&id));
                continue;
            }
            let worker = &mut state.workers[slot];
            if !worker.assign(&request) {
                request.set_busy(false);
                request.set_state(RequestState::Queued);
                state.queue.push_front(id);
                break;
            }
            tracing::debug!(
                request = %id,
                worker = worker.id(),
                host = %request.hostname(),
                "dispatched lookup"
            );
        }
    }

    fn dispatch(&self) {
        let mut disposed = Disposed::new();
        {
            let mut state = self.lock();
            if state.active {
                self.dispatch_locked(&mut state, &mut disposed);
            }
        }
        drop(disposed);
    }

    fn shutdown(&self) -> Result<(), NetError> {
        let (workers, mut disposed) = {
            let mut state = self.lock();
            if !state.active {
                return Err(NetError::NotActive);
            }
            state.active = false;
            state.completions = None;
            state.queue.clear();
            let disposed: HashMap<_, _> = state.requests.drain().collect();
            (std::mem::take(&mut state.workers), disposed)
        };
        tracing::debug!(
            threads = workers.len(),
            requests = disposed.len(),
            "shutting down host resolver"
        );

        for entry in disposed.values() {
            entry.request.cancel();
        }

        let grace = self.config.shutdown_grace();
        for worker in workers {
            let current = worker.current();
            if worker.shutdown(grace) {
                if let Some(entry) = current.and_then(|id| disposed.remove(&id)) {
                    entry.request.set_busy(false);
                }
            }
        }
        Ok(())
    }
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// Bounded worker-thread pool that resolves hostnames off the owning context.
///
/// Cloning is cheap; all clones share the same threads and queue.
///
/// # Example
///
/// ```rust,ignore
/// use hostresolver::dns::{ResolverHandle, ResolverPool, SystemLookup};
///
/// let pool = ResolverPool::new(SystemLookup::new());
/// let mut handle = ResolverHandle::new(&pool, listener);
/// handle.resolve("example.com")?;
/// pool.run_until_idle().await;
/// ```
#[derive(Clone)]
pub struct ResolverPool {
    inner: Arc<PoolInner>,
}

impl ResolverPool {
    /// Creates a pool with the default configuration.
    pub fn new(lookup: impl Lookup + 'static) -> Self {
        Self::with_config(lookup, HostResolverConfig::default())
    }

    /// Creates a pool; no thread is spawned until the first submission.
    pub fn with_config(lookup: impl Lookup + 'static, config: HostResolverConfig) -> Self {
        // One in-flight completion per thread at most.
        let (tx, rx) = mpsc::channel(config.max_threads.max(1));
        Self {
            inner: Arc::new(PoolInner {
                lookup: Arc::new(lookup),
                state: Mutex::new(PoolState {
                    active: true,
                    queue: VecDeque::new(),
                    requests: HashMap::new(),
                    workers: Vec::with_capacity(config.max_threads),
                    next_worker_id: 0,
                    completions: Some(tx),
                }),
                receiver: AsyncMutex::new(rx),
                config,
            }),
        }
    }

    pub fn config(&self) -> &HostResolverConfig {
        &self.inner.config
    }

    /// The lookup primitive worker threads call.
    pub fn lookup(&self) -> &Arc<dyn Lookup> {
        &self.inner.lookup
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().active
    }

    /// Queues `request` and dispatches it if a thread is free.
    ///
    /// # Errors
    ///
    /// - `NotActive` after [`shutdown`](Self::shutdown).
    /// - `HostResolverQueueTooLarge` when `max_queued` requests are waiting
    ///   and the request could not start at once.
    /// - `OutOfMemory` when not even one worker thread can be created.
    ///
    /// An already-cancelled request is accepted and silently dropped.
    pub fn submit(
        &self,
        request: Arc<ResolutionRequest>,
        listener: Arc<dyn ResolveListener>,
    ) -> Result<(), NetError> {
        let id = request.id();
        let mut disposed = Disposed::new();
        let result = {
            let mut state = self.inner.lock();
            self.submit_locked(&mut state, &mut disposed, request, listener)
        };
        drop(disposed);
        if let Err(e) = result {
            tracing::debug!(request = %id, error = %e, "submit rejected");
        }
        result
    }

    fn submit_locked(
        &self,
        state: &mut PoolState,
        disposed: &mut Disposed,
        request: Arc<ResolutionRequest>,
        listener: Arc<dyn ResolveListener>,
    ) -> Result<(), NetError> {
        if !state.active {
            return Err(NetError::NotActive);
        }
        if request.is_cancelled() {
            tracing::trace!(request = %request.id(), "submitted request already cancelled");
            return Ok(());
        }
        if request.state() != RequestState::Idle || state.requests.contains_key(&request.id()) {
            tracing::warn!(request = %request.id(), state = ?request.state(), "request submitted twice");
            return Ok(());
        }
        self.inner.prune_exited(state);
        if state.queue.len() >= self.inner.config.max_queued && !self.inner.can_start_now(state) {
            return Err(NetError::HostResolverQueueTooLarge);
        }
        if state.workers.is_empty() && !self.inner.grow(state) {
            return Err(NetError::OutOfMemory);
        }

        let id = request.id();
        tracing::trace!(request = %id, host = %request.hostname(), "queued");
        request.set_state(RequestState::Queued);
        state.requests.insert(id, PendingResolution { request, listener });
        state.queue.push_back(id);
        self.inner.dispatch_locked(state, disposed);
        Ok(())
    }

    /// Cancels `request` on behalf of its owner.
    ///
    /// A queued request is removed and disposed at once. A running one is
    /// disposed when its worker's completion arrives. Returns false if the
    /// request had already completed.
    pub fn cancel(&self, request: &ResolutionRequest) -> bool {
        let cancelled = request.cancel();
        let id = request.id();

        let removed = {
            let mut state = self.inner.lock();
            if request.is_busy() {
                tracing::trace!(request = %id, "cancelled while running, disposal deferred");
                None
            } else {
                let removed = state.requests.remove(&id);
                if removed.is_some() {
                    state.queue.retain(|queued| *queued != id);
                    tracing::debug!(request = %id, "cancelled queued request");
                }
                removed
            }
        };
        drop(removed);
        cancelled
    }

    /// Finalizes the request served by `worker` and keeps the queue moving.
    ///
    /// Must be called on the owning context; the drain methods do this for
    /// every completion they receive.
    pub(crate) fn on_worker_completed(&self, worker: WorkerId, result: Result<(), NetError>) {
        let finished = {
            let mut guard = self.inner.lock();
            let state = &mut *guard;
            if !state.active {
                tracing::trace!(worker, "completion after shutdown ignored");
                return;
            }
            let Some(thread) = state.workers.iter_mut().find(|w| w.id() == worker) else {
                tracing::warn!(worker, "completion from unknown resolver thread");
                return;
            };
            thread
                .finalize_completion()
                .and_then(|id| state.requests.remove(&id))
        };

        if let Some(entry) = finished {
            let request = &entry.request;
            request.set_busy(false);

            let deliver = result.err().map_or(true, |e| e.is_reportable()) && request.complete();
            if deliver {
                tracing::debug!(request = %request.id(), host = %request.hostname(), ok = result.is_ok(), "resolution finished");
                match result {
                    Ok(()) => entry.listener.on_resolved(request),
                    Err(e) => entry.listener.on_resolution_failed(request, e),
                }
            } else {
                request.set_state(RequestState::Cancelled);
                tracing::debug!(request = %request.id(), "disposed cancelled request");
            }
        }

        self.inner.dispatch();
    }

    /// Handles every completion already posted, without waiting.
    ///
    /// Returns the number of completions processed.
    pub fn process_completions(&self) -> usize {
        let completions: Vec<Completion> = {
            let Ok(mut receiver) = self.inner.receiver.try_lock() else {
                return 0;
            };
            std::iter::from_fn(|| receiver.try_recv().ok()).collect()
        };
        for completion in &completions {
            self.on_worker_completed(completion.worker, completion.result);
        }
        completions.len()
    }

    /// Waits for the next completion and handles it.
    ///
    /// Returns false once the pool has shut down.
    pub async fn next_completion(&self) -> bool {
        if !self.is_active() {
            return false;
        }
        let completion = {
            let mut receiver = self.inner.receiver.lock().await;
            receiver.recv().await
        };
        match completion {
            Some(completion) => {
                self.on_worker_completed(completion.worker, completion.result);
                true
            }
            None => false,
        }
    }

    /// Drives completions until nothing is queued or running.
    pub async fn run_until_idle(&self) {
        while self.has_pending_work() {
            if !self.next_completion().await {
                break;
            }
        }
    }

    /// True while any request is queued or assigned to a thread.
    pub fn has_pending_work(&self) -> bool {
        self.inner.lock().has_pending_work()
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.inner.lock();
        PoolStats {
            threads: state.workers.len(),
            busy_threads: state
                .workers
                .iter()
                .filter(|w| w.current().is_some())
                .count(),
            queued: state.queue.len(),
        }
    }

    /// Stops accepting work, cancels everything outstanding and stops threads.
    ///
    /// Outstanding requests are disposed silently. Each thread gets the
    /// configured grace period to exit before it is detached.
    ///
    /// # Errors
    ///
    /// `NotActive` if the pool was already shut down.
    pub fn shutdown(&self) -> Result<(), NetError> {
        self.inner.shutdown()
    }
}

impl fmt::Debug for ResolverPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("ResolverPool")
            .field("max_threads", &self.inner.config.max_threads)
            .field("threads", &stats.threads)
            .field("busy_threads", &stats.busy_threads)
            .field("queued", &stats.queued)
            .finish()
    }
}
