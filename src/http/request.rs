//! Request buffering.
//!
//! # Responsibilities
//! - Read the inbound body once, bounded by the configured limit
//! - Keep everything needed to rebuild the request for each forward
//! - Carry the client address to the forwarder
//!
//! # Design Decisions
//! - Retries must re-send the identical request, so the body is buffered
//! - The original request is kept for logging; fresh copies are forwarded

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, Request, StatusCode, Uri, Version};
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;
use std::net::SocketAddr;
use thiserror::Error;

/// Client socket address, attached to forwarded requests as an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub SocketAddr);

/// Failure reading the inbound body.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body larger than {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Read(#[from] axum::Error),
}

impl IntoResponse for BodyError {
    fn into_response(self) -> Response {
        let status = match self {
            BodyError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            BodyError::Read(_) => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}

/// An inbound request with its body held in memory.
#[derive(Debug, Clone, Default)]
pub struct BufferedRequest {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub remote_addr: Option<SocketAddr>,
}

impl BufferedRequest {
    /// Buffer `request`, rejecting bodies over `limit` bytes.
    pub async fn from_request(
        request: Request<Body>,
        remote_addr: Option<SocketAddr>,
        limit: usize,
    ) -> Result<Self, BodyError> {
        let declared = request
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared.is_some_and(|len| len > limit) {
            return Err(BodyError::TooLarge { limit });
        }

        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, limit)
            .await
            .map_err(|e| read_error(e, limit))?;

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
            remote_addr,
        })
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Build a fresh request to hand to a forwarder.
    pub fn to_request(&self) -> Request<Body> {
        let mut request = Request::new(Body::from(self.body.clone()));
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.uri.clone();
        *request.version_mut() = self.version;
        *request.headers_mut() = self.headers.clone();
        if let Some(addr) = self.remote_addr {
            request.extensions_mut().insert(ClientAddr(addr));
        }
        request
    }
}

/// Classify a body read failure; hitting the limit mid-stream is `TooLarge`.
fn read_error(error: axum::Error, limit: usize) -> BodyError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&error);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return BodyError::TooLarge { limit };
        }
        source = e.source();
    }
    BodyError::Read(error)
}
