//! Request dispatch subsystem.
//!
//! # State Machine (per request)
//! ```text
//! DISPATCHING
//!     → next live backend from the pool (none → 503)
//!     → forward
//!         → SUCCESS: response returned as-is
//!         → PROXY_ERROR, retries < max: wait, RETRY_SAME_BACKEND
//!         → PROXY_ERROR, retries spent: MARK_DEAD_AND_REDISPATCH
//!               (attempts + 1, retries reset)
//!     → attempts > max: EXHAUSTED (503)
//! ```
//!
//! # Design Decisions
//! - Explicit bounded loop, no recursion
//! - Counters live in a `RequestContext` value, not in the request
//! - Liveness changes go through the pool, never directly to a backend

pub mod controller;

pub use controller::{DispatchController, DispatchError, Dispatched};
