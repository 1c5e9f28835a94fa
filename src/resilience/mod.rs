//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarding error on a backend:
//!     → retries.rs (retry same backend after a fixed delay?)
//!     → or escalate: backend marked dead, next backend selected
//!     → attempts ceiling ends the request with 503
//! ```
//!
//! # Design Decisions
//! - Transient blips are absorbed by same-backend retries
//! - A backend is marked dead only after its retry budget is spent
//! - Both budgets are small and fixed; worst case is attempts × (retries + 1) calls

pub mod retries;

pub use retries::{OnError, RequestContext, RetryPolicy};
