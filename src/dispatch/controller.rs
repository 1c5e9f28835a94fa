//! Per-request dispatch with retry and failover.

use axum::body::Body;
use axum::http::Response;
use axum::response::IntoResponse;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::http::request::BufferedRequest;
use crate::http::response::service_unavailable;
use crate::load_balancer::{Backend, BackendPool, ForwardError};
use crate::observability::metrics;
use crate::resilience::{OnError, RequestContext, RetryPolicy};

/// Terminal dispatch failures. Both surface to the client as 503.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("max attempts reached (attempt {attempts})")]
    Exhausted { attempts: u32 },

    #[error("no live backend available")]
    NoLiveBackend,
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> axum::response::Response {
        service_unavailable()
    }
}

/// A successfully forwarded request.
pub struct Dispatched {
    pub response: Response<Body>,
    /// Backend that produced the response.
    pub backend: Url,
    /// Counters at the moment of success.
    pub context: RequestContext,
}

impl fmt::Debug for Dispatched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatched")
            .field("status", &self.response.status())
            .field("backend", &self.backend.as_str())
            .field("context", &self.context)
            .finish()
    }
}

/// Routes each request to a live backend, retrying and failing over on
/// forwarding errors.
#[derive(Debug)]
pub struct DispatchController {
    pool: Arc<BackendPool>,
    policy: RetryPolicy,
}

impl DispatchController {
    pub fn new(pool: Arc<BackendPool>, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &Arc<BackendPool> {
        &self.pool
    }

    /// Dispatch one request.
    ///
    /// Each attempt selects a live backend and forwards to it, retrying the
    /// same backend up to `max_retries` times. A backend whose retries are
    /// spent is marked dead and the next attempt selects another. The request
    /// fails once `max_attempts` is exceeded or no backend is alive.
    pub async fn dispatch(&self, request: &BufferedRequest) -> Result<Dispatched, DispatchError> {
        let mut ctx = RequestContext::new();

        loop {
            if ctx.exhausted(&self.policy) {
                tracing::warn!(
                    remote_addr = ?request.remote_addr,
                    path = %request.path(),
                    attempts = ctx.attempts,
                    "Max attempts reached, terminating"
                );
                return Err(DispatchError::Exhausted {
                    attempts: ctx.attempts,
                });
            }

            let Some(backend) = self.pool.next_active_peer() else {
                tracing::warn!(
                    remote_addr = ?request.remote_addr,
                    path = %request.path(),
                    "No live backend available"
                );
                return Err(DispatchError::NoLiveBackend);
            };

            match self.forward_with_retries(&backend, request, &mut ctx).await {
                Ok(response) => {
                    return Ok(Dispatched {
                        response,
                        backend: backend.endpoint().clone(),
                        context: ctx,
                    });
                }
                Err(_) => {
                    self.pool.mark_backend_status(backend.endpoint(), false);
                    metrics::record_marked_dead(backend.endpoint().as_str());
                    ctx.next_attempt();
                    tracing::info!(
                        remote_addr = ?request.remote_addr,
                        path = %request.path(),
                        attempt = ctx.attempts,
                        "Attempting another backend"
                    );
                }
            }
        }
    }

    /// Forward to one backend until it succeeds or its retries run out.
    async fn forward_with_retries(
        &self,
        backend: &Backend,
        request: &BufferedRequest,
        ctx: &mut RequestContext,
    ) -> Result<Response<Body>, ForwardError> {
        loop {
            let error = match backend.forward(request.to_request()).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            tracing::warn!(
                backend = %backend.endpoint(),
                remote_addr = ?request.remote_addr,
                path = %request.path(),
                retries = ctx.retries,
                error = %error,
                "Proxy error"
            );

            match ctx.on_error(&self.policy) {
                OnError::RetrySame => {
                    metrics::record_retry(backend.endpoint().as_str());
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                OnError::Escalate => return Err(error),
            }
        }
    }
}
