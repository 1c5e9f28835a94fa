//! Response helpers.
//!
//! Backend responses pass through untouched apart from hop-by-hop header
//! removal (see forward.rs). The only response the load balancer writes
//! itself is the uniform 503.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub const SERVICE_UNAVAILABLE_BODY: &str = "Service not available.";

/// The 503 returned when no backend could serve a request.
pub fn service_unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, SERVICE_UNAVAILABLE_BODY).into_response()
}
