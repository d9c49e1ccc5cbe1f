use thiserror::Error;

/// Errors surfaced by the host resolver.
///
/// Codes follow Chromium's `net_error_list.h` where an equivalent exists;
/// resolver-specific conditions live in the custom range starting at -900.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum NetError {
    /// The request was cancelled. Never delivered to a listener.
    #[error("Operation aborted")]
    ErrorHandled,
    #[error("Invalid argument")]
    OutOfRange,
    #[error("Out of memory")]
    OutOfMemory,

    // Resolver Errors
    #[error("Name not resolved")]
    HostNotFound,
    #[error("Host resolver queue too large")]
    HostResolverQueueTooLarge,
    #[error("Name resolution failed")]
    NetworkError,

    // Custom errors (codes starting at -900)
    #[error("Host resolver is not active")]
    NotActive,

    #[error("Unknown network error {0}")]
    Unknown(i32),
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::ErrorHandled => -3,
            NetError::OutOfRange => -4,
            NetError::OutOfMemory => -13,
            NetError::HostNotFound => -105,
            NetError::HostResolverQueueTooLarge => -119,
            NetError::NetworkError => -137,
            NetError::NotActive => -900,
            NetError::Unknown(code) => *code,
        }
    }

    /// Whether this error is terminal for the request that produced it.
    ///
    /// `ErrorHandled` is the cancellation sentinel and is never reported.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, NetError::ErrorHandled)
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -3 => NetError::ErrorHandled,
            -4 => NetError::OutOfRange,
            -13 => NetError::OutOfMemory,
            -105 => NetError::HostNotFound,
            -119 => NetError::HostResolverQueueTooLarge,
            -137 => NetError::NetworkError,
            -900 => NetError::NotActive,
            _ => NetError::Unknown(code),
        }
    }
}
