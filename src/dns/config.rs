//! Resolver pool configuration.
//!
//! Central configuration for the worker-thread host resolver, loadable from
//! JSON so embedders can tune it without recompiling.

use super::retry::RetryPolicy;
use serde::Deserialize;
use std::{fs, path::Path, time::Duration};
use thiserror::Error;

/// Errors raised while loading a [`HostResolverConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read resolver config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid resolver config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration options for [`ResolverPool`](super::ResolverPool).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HostResolverConfig {
    /// Maximum number of worker threads.
    pub max_threads: usize,

    /// Maximum number of requests waiting for a free thread.
    pub max_queued: usize,

    /// Retry behavior for transient lookup failures.
    pub retry: RetryPolicy,

    /// How long shutdown waits for each worker thread to exit.
    pub shutdown_grace_ms: u64,

    /// Name given to worker threads.
    pub thread_name: String,

    /// Stack size for worker threads (None = platform default).
    pub thread_stack_size: Option<usize>,
}

impl Default for HostResolverConfig {
    fn default() -> Self {
        Self {
            max_threads: 8,
            max_queued: 256,
            retry: RetryPolicy::default(),
            shutdown_grace_ms: 2000,
            thread_name: "host-resolver".to_string(),
            thread_stack_size: None,
        }
    }
}

impl HostResolverConfig {
    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn with_max_queued(mut self, max_queued: usize) -> Self {
        self.max_queued = max_queued;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn with_thread_stack_size(mut self, size: usize) -> Self {
        self.thread_stack_size = Some(size);
        self
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
