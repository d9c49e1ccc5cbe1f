//! Ergonomic error context helpers.
//!
//! Provides an extension trait for classifying IO errors returned by the
//! operating system resolver into typed `LookupError` variants.

use crate::dns::LookupError;
use std::io;

/// Extension trait for adding resolver context to IO Results.
pub trait IoResultExt<T> {
    /// Classify a `getaddrinfo` failure for `host`.
    ///
    /// # Example
    /// ```ignore
    /// use hostresolver::base::context::IoResultExt;
    ///
    /// let addrs = ("example.com", 0).to_socket_addrs().lookup_context("example.com")?;
    /// // Err(LookupError::NotFound) for a name that does not exist
    /// ```
    fn lookup_context(self, host: &str) -> Result<T, LookupError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn lookup_context(self, host: &str) -> Result<T, LookupError> {
        self.map_err(|e| classify_lookup_error(host, &e))
    }
}

/// Maps an OS resolver error onto the lookup taxonomy.
///
/// The standard library reports `EAI_*` codes only through the error message,
/// so the classification matches on the gai_strerror texts of glibc, musl,
/// macOS and Windows.
pub fn classify_lookup_error(host: &str, error: &io::Error) -> LookupError {
    let message = error.to_string().to_ascii_lowercase();

    const TRANSIENT: &[&str] = &[
        "temporary failure",
        "try again",
        "temporary error during hostname resolution",
    ];
    const NOT_FOUND: &[&str] = &[
        "name or service not known",
        "no address associated",
        "nodename nor servname",
        "no such host",
        "name does not resolve",
    ];

    if error.kind() == io::ErrorKind::WouldBlock
        || TRANSIENT.iter().any(|needle| message.contains(needle))
    {
        return LookupError::TryAgain;
    }
    if error.kind() == io::ErrorKind::NotFound
        || NOT_FOUND.iter().any(|needle| message.contains(needle))
    {
        return LookupError::NotFound;
    }
    tracing::trace!(host = %host, error = %error, "unclassified resolver error");
    LookupError::Failed(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_lookup_context_not_found() {
        let result: Result<(), io::Error> = Err(Error::new(
            ErrorKind::Other,
            "failed to lookup address information: Name or service not known",
        ));
        let err = result.lookup_context("unknown.example.com").unwrap_err();
        assert_eq!(err, LookupError::NotFound);
    }

    #[test]
    fn test_lookup_context_try_again() {
        let result: Result<(), io::Error> = Err(Error::new(
            ErrorKind::Other,
            "failed to lookup address information: Temporary failure in name resolution",
        ));
        let err = result.lookup_context("flaky.example.com").unwrap_err();
        assert_eq!(err, LookupError::TryAgain);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_lookup_context_other() {
        let result: Result<(), io::Error> =
            Err(Error::new(ErrorKind::OutOfMemory, "cannot allocate memory"));
        let err = result.lookup_context("example.com").unwrap_err();
        assert!(matches!(err, LookupError::Failed(_)));
        assert!(!err.is_retryable());
    }
}
