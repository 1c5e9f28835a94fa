//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the single catch-all handler
//! - Wire up middleware (tracing, request ID)
//! - Buffer each request and hand it to the dispatch controller
//! - Run the health monitor alongside the server
//! - Serve until shutdown, draining in-flight requests

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::LbConfig;
use crate::dispatch::DispatchController;
use crate::health::HealthMonitor;
use crate::http::request::BufferedRequest;
use crate::load_balancer::BackendPool;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<DispatchController>,
    pub max_body_bytes: usize,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    config: LbConfig,
    pool: Arc<BackendPool>,
}

impl HttpServer {
    /// Create a new HTTP server over an already-built pool.
    pub fn new(config: LbConfig, pool: Arc<BackendPool>) -> Self {
        let dispatcher = Arc::new(DispatchController::new(
            pool.clone(),
            RetryPolicy::from(&config.dispatch),
        ));

        let state = AppState {
            dispatcher,
            max_body_bytes: config.listener.max_body_bytes,
        };

        let router = Self::build_router(state);
        Self {
            router,
            config,
            pool,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server, accepting connections on the given listener, until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.pool.len(),
            "HTTP server starting"
        );

        if self.config.health_check.enabled {
            let monitor = HealthMonitor::new(self.pool.clone(), self.config.health_check.clone());
            tokio::spawn(monitor.run(shutdown.resubscribe()));
        } else {
            tracing::info!("Active health checks disabled");
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: buffer, dispatch, and relay the backend response.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let request = match BufferedRequest::from_request(request, remote_addr, state.max_body_bytes).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(remote_addr = ?remote_addr, error = %e, "Rejected request body");
            return e.into_response();
        }
    };

    tracing::debug!(
        method = %request.method,
        path = %request.path(),
        remote_addr = ?remote_addr,
        "Dispatching request"
    );

    match state.dispatcher.dispatch(&request).await {
        Ok(dispatched) => {
            metrics::record_request(
                dispatched.response.status().as_u16(),
                dispatched.backend.as_str(),
                start_time,
            );
            dispatched.response.into_response()
        }
        Err(e) => {
            metrics::record_request(503, "none", start_time);
            e.into_response()
        }
    }
}
