//! Backend pool management.
//!
//! # Responsibilities
//! - Hold the fixed, ordered set of backends
//! - Rotate through them round-robin, skipping dead ones
//! - Apply liveness updates addressed by endpoint

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

use crate::load_balancer::backend::Backend;
use crate::observability::metrics;

/// The ordered set of backends plus the shared rotation cursor.
///
/// Membership is built with [`BackendPool::add_backend`] before the pool is
/// shared; afterwards it lives behind an `Arc` and only the cursor and each
/// backend's liveness change.
#[derive(Debug, Default)]
pub struct BackendPool {
    backends: Vec<Arc<Backend>>,
    current: AtomicUsize,
}

impl BackendPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a backend to the rotation.
    pub fn add_backend(&mut self, backend: Backend) {
        self.backends.push(Arc::new(backend));
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// All backends in rotation order (for health checking).
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    /// Current raw cursor value.
    pub fn cursor(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Advance the cursor and return the new value modulo the pool size.
    ///
    /// The pool must not be empty.
    pub fn next_index(&self) -> usize {
        debug_assert!(!self.backends.is_empty(), "next_index on an empty pool");
        let next = self.current.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        next % self.backends.len()
    }

    /// Select the next live backend, starting from [`next_index`](Self::next_index)
    /// and scanning one full cycle.
    ///
    /// When the first live backend is not at the starting index the cursor is
    /// moved onto it, so the next caller starts next to a live backend.
    pub fn next_active_peer(&self) -> Option<Arc<Backend>> {
        if self.backends.is_empty() {
            return None;
        }

        let len = self.backends.len();
        let next = self.next_index();
        for i in next..next + len {
            let index = i % len;
            let backend = &self.backends[index];
            if backend.is_alive() {
                if i != next {
                    self.current.store(index, Ordering::SeqCst);
                }
                return Some(backend.clone());
            }
        }
        None
    }

    /// Set the liveness of the backend at `endpoint`.
    ///
    /// Unknown endpoints are ignored.
    pub fn mark_backend_status(&self, endpoint: &Url, alive: bool) {
        match self.backends.iter().find(|b| b.endpoint() == endpoint) {
            Some(backend) => {
                let was_alive = backend.set_alive(alive);
                if was_alive != alive {
                    tracing::info!(
                        backend = %endpoint,
                        alive,
                        "Backend liveness changed"
                    );
                }
                metrics::record_backend_health(endpoint.as_str(), alive);
            }
            None => {
                tracing::debug!(backend = %endpoint, "Status update for unknown backend ignored");
            }
        }
    }

    /// Number of backends currently believed alive.
    pub fn alive_count(&self) -> usize {
        self.backends.iter().filter(|b| b.is_alive()).count()
    }
}
