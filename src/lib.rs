//! # hostresolver
//!
//! Asynchronous hostname resolution on a bounded pool of worker threads.
//!
//! The system resolver blocks. `hostresolver` keeps it off the caller's task
//! by handing each lookup to one of a fixed number of OS threads, queueing the
//! overflow in FIFO order, retrying transient failures, and reporting results
//! back through a listener on the owning context.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hostresolver::dns::{ResolverHandle, ResolverPool, SystemLookup};
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = ResolverPool::new(SystemLookup::new());
//!     let mut handle = ResolverHandle::new(&pool, listener);
//!     handle.resolve("example.com").unwrap();
//!     pool.run_until_idle().await;
//!     pool.shutdown().unwrap();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error codes, request states and error context helpers
//! - [`dns`] - Address lists, lookups, the resolver pool and handles

pub mod base;
pub mod dns;
