//! Host resolution module
//!
//! Resolves hostnames to address lists on a bounded pool of worker threads,
//! so the blocking system primitive never runs on the owning context.
//!
//! # Architecture
//!
//! - [`ResolverHandle`]: one caller-owned "resolve this hostname" operation.
//! - [`ResolverPool`]: FIFO queue plus up to `max_threads` worker threads.
//! - [`ResolutionRequest`]: the unit of work shared by handle, pool and thread.
//! - [`Lookup`]: the blocking primitive. [`SystemLookup`] wraps getaddrinfo,
//!   `HickoryLookup` uses hickory-resolver, [`LookupWithOverrides`] pins names.
//!
//! Results come back through [`ResolveListener`], invoked on whichever task
//! drains the pool's completions.
//!
//! # Example
//!
//! ```rust,ignore
//! use hostresolver::dns::{ResolverHandle, ResolverPool, SystemLookup};
//!
//! let pool = ResolverPool::new(SystemLookup::new());
//! let mut handle = ResolverHandle::new(&pool, listener);
//! handle.resolve("example.com")?;
//! pool.run_until_idle().await;
//! println!("{} addresses", handle.address_count());
//! ```

mod address;
mod config;
mod gai;
mod handle;
#[cfg(feature = "hickory")]
mod hickory;
mod lookup;
mod pool;
mod request;
mod retry;
mod worker;

pub use address::{Address, AddressFamily, AddressList};
pub use config::{ConfigError, HostResolverConfig};
pub use gai::SystemLookup;
pub use handle::{HandleState, ResolveListener, ResolverHandle};
#[cfg(feature = "hickory")]
pub use hickory::HickoryLookup;
pub use lookup::{Lookup, LookupError, LookupWithOverrides, Name};
pub use pool::{PoolStats, ResolverPool};
pub use request::{RequestId, ResolutionRequest};
pub use retry::RetryPolicy;
pub use worker::WorkerId;
