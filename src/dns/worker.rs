//! Resolver worker threads.
//!
//! Each [`WorkerThread`] wraps one OS thread that sleeps on a condition
//! variable until the pool hands it a request, runs the blocking lookup, and
//! posts a [`Completion`] back to the owning context over a bounded channel.
//! The pool-side half only remembers *which* request the thread is serving
//! (its [`RequestId`]); the pool keeps ownership of the request itself.

use super::{HostResolverConfig, Lookup, RequestId, ResolutionRequest, RetryPolicy};
use crate::base::neterror::NetError;
use std::{
    fmt, io,
    panic::{self, AssertUnwindSafe},
    sync::{mpsc as std_mpsc, Arc, Condvar, Mutex, PoisonError},
    thread::{self, JoinHandle},
    time::Duration,
};
use tokio::sync::mpsc;

/// Identifies a worker thread within its pool.
pub type WorkerId = usize;

/// Message posted from a worker thread to the owning context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Completion {
    pub(crate) worker: WorkerId,
    pub(crate) result: Result<(), NetError>,
}

/// Start signal shared by both halves.
struct Slot {
    job: Option<Arc<ResolutionRequest>>,
    active: bool,
}

struct Shared {
    slot: Mutex<Slot>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Pool-side handle of one worker thread.
pub(crate) struct WorkerThread {
    id: WorkerId,
    shared: Arc<Shared>,
    current: Option<RequestId>,
    thread: Option<JoinHandle<()>>,
    exited: std_mpsc::Receiver<()>,
}

impl WorkerThread {
    /// Spawns the thread; its body blocks until the first assignment.
    pub(crate) fn spawn(
        id: WorkerId,
        config: &HostResolverConfig,
        lookup: Arc<dyn Lookup>,
        completions: mpsc::Sender<Completion>,
    ) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot {
                job: None,
                active: true,
            }),
            wake: Condvar::new(),
        });
        let (exit_tx, exit_rx) = std_mpsc::channel();

        let body = WorkerBody {
            id,
            shared: Arc::clone(&shared),
            lookup,
            retry: config.retry.clone(),
            completions,
            _exit: exit_tx,
        };

        let mut builder = thread::Builder::new().name(format!("{}-{}", config.thread_name, id));
        if let Some(size) = config.thread_stack_size {
            builder = builder.stack_size(size);
        }
        let thread = builder.spawn(move || body.run())?;
        tracing::debug!(worker = id, "spawned resolver thread");

        Ok(Self {
            id,
            shared,
            current: None,
            thread: Some(thread),
            exited: exit_rx,
        })
    }

    pub(crate) fn id(&self) -> WorkerId {
        self.id
    }

    /// The request this thread is serving, until its completion is finalized.
    pub(crate) fn current(&self) -> Option<RequestId> {
        self.current
    }

    /// True once the OS thread has returned; such a worker never runs again.
    pub(crate) fn has_exited(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Whether [`assign`](Self::assign) would accept a request right now.
    pub(crate) fn is_idle(&self) -> bool {
        self.current.is_none()
            && self.thread.as_ref().is_some_and(|t| !t.is_finished())
            && self.shared.lock().active
    }

    /// Hands `request` to the thread and wakes it.
    ///
    /// Returns false, without taking the request, if the thread is already
    /// serving one or is shutting down.
    pub(crate) fn assign(&mut self, request: &Arc<ResolutionRequest>) -> bool {
        if !self.is_idle() {
            return false;
        }
        {
            let mut slot = self.shared.lock();
            if !slot.active || slot.job.is_some() {
                return false;
            }
            slot.job = Some(Arc::clone(request));
        }
        self.current = Some(request.id());
        self.shared.wake.notify_one();
        true
    }

    /// Clears the assignment once the thread's completion has been received.
    pub(crate) fn finalize_completion(&mut self) -> Option<RequestId> {
        self.current.take()
    }

    /// Stops the thread, waiting at most `grace` for it to exit.
    ///
    /// A thread stuck inside the lookup primitive cannot be interrupted; it is
    /// detached and exits on its own once the primitive returns. Returns true
    /// if the thread exited within the grace period.
    pub(crate) fn shutdown(mut self, grace: Duration) -> bool {
        self.signal_stop();

        let Some(thread) = self.thread.take() else {
            return true;
        };
        match self.exited.recv_timeout(grace) {
            Ok(()) | Err(std_mpsc::RecvTimeoutError::Disconnected) => {
                if thread.join().is_err() {
                    tracing::warn!(worker = self.id, "resolver thread panicked");
                }
                true
            }
            Err(std_mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    worker = self.id,
                    request = ?self.current,
                    grace_ms = grace.as_millis() as u64,
                    "resolver thread did not exit in time, detaching"
                );
                false
            }
        }
    }

    pub(crate) fn signal_stop(&self) {
        {
            let mut slot = self.shared.lock();
            slot.active = false;
            // Assigned but not yet picked up; never runs.
            slot.job = None;
        }
        self.shared.wake.notify_all();
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

impl fmt::Debug for WorkerThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerThread")
            .field("id", &self.id)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

/// Thread-side half; moved into the spawned thread.
struct WorkerBody {
    id: WorkerId,
    shared: Arc<Shared>,
    lookup: Arc<dyn Lookup>,
    retry: RetryPolicy,
    completions: mpsc::Sender<Completion>,
    /// Dropped when the body returns, which wakes a waiting `shutdown`.
    _exit: std_mpsc::Sender<()>,
}

impl WorkerBody {
    fn run(self) {
        while let Some(request) = self.next_job() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                request.run(self.lookup.as_ref(), &self.retry)
            }))
            .unwrap_or_else(|_| {
                tracing::error!(worker = self.id, request = %request.id(), "lookup primitive panicked");
                request.record_failure(NetError::NetworkError)
            })
            .map(|_| ());
            drop(request);

            // Capacity covers one completion per thread, so this never parks.
            let completion = Completion {
                worker: self.id,
                result,
            };
            if self.completions.blocking_send(completion).is_err() {
                tracing::trace!(worker = self.id, "owning context gone, completion dropped");
            }
        }
        tracing::debug!(worker = self.id, "resolver thread exiting");
    }

    fn next_job(&self) -> Option<Arc<ResolutionRequest>> {
        let mut slot = self.shared.lock();
        loop {
            if !slot.active {
                return None;
            }
            if let Some(job) = slot.job.take() {
                return Some(job);
            }
            slot = self
                .shared
                .wake
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}
