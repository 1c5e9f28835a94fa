//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → TCP connect to each backend (bounded timeout)
//!     → Update state.rs
//!
//! Dispatch escalation (dispatch::controller):
//!     Retries against one backend exhausted
//!     → pool marks the backend dead
//!     → Update state.rs
//!
//! State (state.rs):
//!     Alive ←→ Dead, one synchronized cell per backend
//! ```
//!
//! # Design Decisions
//! - A probe is a connection attempt, not an application request
//! - Probes never fail a request; they only steer future selections
//! - Health state is per-backend, not per-pool

pub mod active;
pub mod state;

pub use active::HealthMonitor;
