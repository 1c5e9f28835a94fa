//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend with a plain TCP connect
//! - Flip each backend's liveness to match the probe result

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::time::{self, Instant};

use crate::config::HealthCheckConfig;
use crate::load_balancer::{Backend, BackendPool};
use crate::observability::metrics;

/// Why a probe failed.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("backend url has no probe address")]
    NoAddress,

    #[error("site unreachable: {0}")]
    Connect(#[from] std::io::Error),

    #[error("connect timed out after {0:?}")]
    Timeout(Duration),
}

/// Attempt a TCP connection to `address` within `timeout`.
pub async fn probe(address: &str, timeout: Duration) -> Result<(), ProbeError> {
    match time::timeout(timeout, TcpStream::connect(address)).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(e)) => Err(ProbeError::Connect(e)),
        Err(_) => Err(ProbeError::Timeout(timeout)),
    }
}

pub struct HealthMonitor {
    pool: Arc<BackendPool>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(pool: Arc<BackendPool>, config: HealthCheckConfig) -> Self {
        Self { pool, config }
    }

    /// Run checks every `interval_secs` until shutdown.
    ///
    /// The first check happens one interval after start; backends are
    /// assumed alive until then.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.config.interval_secs,
            timeout_secs = self.config.timeout_secs,
            "Health monitor starting"
        );

        let interval = Duration::from_secs(self.config.interval_secs);
        let mut ticker = time::interval_at(Instant::now() + interval, interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::info!("Starting health check...");
                    self.check_all().await;
                    tracing::info!("Health check completed");
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every backend once, concurrently, and record the results.
    pub async fn check_all(&self) {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        join_all(
            self.pool
                .backends()
                .iter()
                .map(|backend| check_backend(backend, timeout)),
        )
        .await;
    }
}

async fn check_backend(backend: &Backend, timeout: Duration) {
    let result = match backend.probe_address() {
        Some(address) => probe(&address, timeout).await,
        None => Err(ProbeError::NoAddress),
    };

    let alive = match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(backend = %backend.endpoint(), error = %e, "Health probe failed");
            false
        }
    };

    backend.set_alive(alive);
    metrics::record_backend_health(backend.endpoint().as_str(), alive);

    let status = if alive { "up" } else { "down" };
    tracing::info!(backend = %backend.endpoint(), status, "Backend status");
}
