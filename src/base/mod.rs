//! Base types and error handling.
//!
//! Provides foundational types mirroring Chromium's `net/base/`:
//! - [`NetError`](neterror::NetError): Network error codes matching `net_error_list.h`
//! - [`RequestState`](requeststate::RequestState): Resolution request lifecycle states

pub mod context;
pub mod neterror;
pub mod requeststate;
