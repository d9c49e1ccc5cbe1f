/// The lifecycle state of a ResolutionRequest.
/// This roughly matches the job states of net/dns/host_resolver_manager.h
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    /// Created but not yet handed to a pool.
    #[default]
    Idle,

    /// Waiting in the pool queue for a free worker thread.
    Queued,

    /// Assigned to a worker thread; the blocking lookup may be in progress.
    Running,

    /// Cancelled by its owner or by pool shutdown. Never reported.
    Cancelled,

    /// Finalized on the owning context; result is readable.
    Completed,
}

impl RequestState {
    /// Returns true once no further transition can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Cancelled | RequestState::Completed)
    }
}
