//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Build the backend pool, one forwarder per endpoint
//! - Start the metrics exporter when enabled
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, nothing is served with a
//!   partially valid backend set
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{parse_endpoint, validate_config, ConfigError, LbConfig, ValidationError};
use crate::http::forward::{upstream_client, HttpForwarder};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{Backend, BackendPool};
use crate::observability::metrics;

/// Fatal errors before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid backend: {0}")]
    Endpoint(#[from] ValidationError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Build the pool from configured endpoints, in order.
pub fn build_pool(config: &LbConfig) -> Result<BackendPool, ValidationError> {
    let client = upstream_client(&config.timeouts);
    let request_timeout = Duration::from_secs(config.timeouts.request_secs);

    let mut pool = BackendPool::new();
    for backend in &config.backends {
        let endpoint = parse_endpoint(&backend.url)?;
        let forwarder = HttpForwarder::new(endpoint.clone(), client.clone(), request_timeout);
        tracing::info!(endpoint = %endpoint, "Configured endpoint");
        pool.add_backend(Backend::new(endpoint, Arc::new(forwarder)));
    }
    Ok(pool)
}

/// Validate `config`, build everything, and serve until `shutdown` fires.
pub async fn start(config: LbConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    let pool = Arc::new(build_pool(&config)?);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    tracing::info!(address = %address, "Load balancer started");

    HttpServer::new(config, pool)
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}
