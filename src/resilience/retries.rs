//! Retry bookkeeping for a single request.
//!
//! # Responsibilities
//! - Count attempts (distinct backends tried) and retries (same backend)
//! - Decide between retrying the same backend and escalating
//!
//! # Design Decisions
//! - Fixed retry delay, no backoff curve
//! - Counters live in a value owned by the dispatch loop, never in the request

use std::time::Duration;

use crate::config::DispatchConfig;

/// Retry and attempt ceilings for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Distinct backends tried before the request is abandoned.
    pub max_attempts: u32,
    /// Retries against one backend before it is considered dead.
    pub max_retries: u32,
    /// Pause before each same-backend retry.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}

impl From<&DispatchConfig> for RetryPolicy {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// What to do after a forwarding error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnError {
    /// Wait, then forward to the same backend again.
    RetrySame,
    /// Mark the backend dead and select another.
    Escalate,
}

/// Per-request `{attempts, retries}` counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub attempts: u32,
    pub retries: u32,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            attempts: 1,
            retries: 0,
        }
    }
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once more distinct backends were tried than the policy allows.
    pub fn exhausted(&self, policy: &RetryPolicy) -> bool {
        self.attempts > policy.max_attempts
    }

    /// Classify a forwarding error, bumping `retries` when retrying.
    pub fn on_error(&mut self, policy: &RetryPolicy) -> OnError {
        if self.retries < policy.max_retries {
            self.retries += 1;
            OnError::RetrySame
        } else {
            OnError::Escalate
        }
    }

    /// Move on to a fresh backend: one more attempt, retries start over.
    pub fn next_attempt(&mut self) {
        self.attempts += 1;
        self.retries = 0;
    }
}
