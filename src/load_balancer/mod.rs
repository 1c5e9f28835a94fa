//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request dispatched
//!     → pool.rs (advance cursor, scan for the next live backend)
//!     → backend.rs (forward through the backend's capability)
//!     → On exhausted retries: pool.rs marks the backend dead
//! ```
//!
//! # Design Decisions
//! - Round-robin only; the cursor is an atomic owned by the pool
//! - Dead backends are skipped, never removed
//! - Membership is fixed after startup, so selection takes no lock

pub mod backend;
pub mod pool;

pub use backend::{Backend, Forward, ForwardError};
pub use pool::BackendPool;
