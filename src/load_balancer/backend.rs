//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server
//! - Track liveness (alive/dead) behind a synchronized cell
//! - Own the capability that forwards a request to this server

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::health::state::Liveness;

/// Errors produced while forwarding a request upstream.
///
/// Only transport failures are errors; any HTTP status returned by the
/// backend counts as a completed forward.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Connection or protocol failure talking to the backend.
    #[error("upstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    /// The backend did not answer in time.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    /// The rewritten target URI was rejected.
    #[error("invalid upstream uri: {0}")]
    InvalidUri(#[from] axum::http::uri::InvalidUri),

    /// The outgoing request could not be assembled.
    #[error("failed to build upstream request: {0}")]
    Build(#[from] axum::http::Error),
}

/// Capability that proxies a request to one fixed upstream.
#[async_trait]
pub trait Forward: Send + Sync {
    async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError>;
}

/// A single backend server.
pub struct Backend {
    endpoint: Url,
    alive: Liveness,
    forwarder: Arc<dyn Forward>,
}

impl Backend {
    /// Create a new backend. Backends start out alive.
    pub fn new(endpoint: Url, forwarder: Arc<dyn Forward>) -> Self {
        Self {
            endpoint,
            alive: Liveness::default(),
            forwarder,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// `host:port` used for TCP reachability probes.
    pub fn probe_address(&self) -> Option<String> {
        let host = self.endpoint.host_str()?;
        let port = self.endpoint.port_or_known_default()?;
        Some(format!("{}:{}", host, port))
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// Update liveness. Returns the previous state.
    pub fn set_alive(&self, alive: bool) -> bool {
        self.alive.set(alive)
    }

    /// Forward a request to this backend.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        self.forwarder.forward(request).await
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("endpoint", &self.endpoint.as_str())
            .field("alive", &self.is_alive())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_probe_address_uses_known_default_port() {
        let b = backend("http://example.com/api", ScriptedForwarder::ok("x"));
        assert_eq!(b.probe_address().as_deref(), Some("example.com:80"));

        let b = backend("http://127.0.0.1:3031", ScriptedForwarder::ok("x"));
        assert_eq!(b.probe_address().as_deref(), Some("127.0.0.1:3031"));
    }

    #[test]
    fn test_liveness_toggles() {
        let b = backend("http://127.0.0.1:3031", ScriptedForwarder::ok("x"));
        assert!(b.is_alive());
        b.set_alive(false);
        assert!(!b.is_alive());
        b.set_alive(true);
        assert!(b.is_alive());
    }

    #[tokio::test]
    async fn test_forward_delegates_to_capability() {
        let fwd = ScriptedForwarder::failing_first(1, "ok");
        let b = backend("http://127.0.0.1:3031", fwd.clone());

        assert!(b.forward(Request::new(Body::empty())).await.is_err());
        let res = b.forward(Request::new(Body::empty())).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(fwd.calls(), 2);
    }
}
