//! Backend liveness state.
//!
//! # States
//! - Alive: backend receives traffic
//! - Dead: backend skipped by selection until a probe succeeds
//!
//! # State Transitions
//! ```text
//! Alive → Dead:  health probe fails, or dispatch exhausts retries on it
//! Dead → Alive:  health probe succeeds
//! ```
//!
//! # Design Decisions
//! - One cell per backend, no pool-wide lock
//! - The raw flag is never exposed, only `get`/`set`

use std::sync::atomic::{AtomicBool, Ordering};

/// A synchronized boolean liveness flag.
///
/// Writers (the health monitor, dispatch escalation) and readers (pool
/// selection) run concurrently. Release/acquire ordering makes a write visible
/// in full to every subsequent read.
#[derive(Debug)]
pub struct Liveness {
    alive: AtomicBool,
}

impl Liveness {
    pub fn new(alive: bool) -> Self {
        Self {
            alive: AtomicBool::new(alive),
        }
    }

    pub fn get(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Store the new state, returning the previous one.
    pub fn set(&self, alive: bool) -> bool {
        self.alive.swap(alive, Ordering::AcqRel)
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new(true)
    }
}
