//! Forwarding requests to a single upstream.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the backend's base URL
//! - Strip hop-by-hop headers and append `X-Forwarded-For`
//! - Send through a shared hyper client with connect/request timeouts
//!
//! # Design Decisions
//! - Inbound `Host` is preserved
//! - Any HTTP status is a successful forward; only transport failures error
//! - Responses stream back without buffering

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Response, Uri, Version};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::time::Duration;
use tokio::time;
use url::{Position, Url};

use crate::config::TimeoutConfig;
use crate::http::request::ClientAddr;
use crate::load_balancer::{Forward, ForwardError};

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

const X_FORWARDED_FOR: &str = "x-forwarded-for";

pub type UpstreamClient = Client<HttpConnector, Body>;

/// Build the upstream client shared by every backend's forwarder.
pub fn upstream_client(timeouts: &TimeoutConfig) -> UpstreamClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
    Client::builder(TokioExecutor::new()).build(connector)
}

/// Reverse proxy to one backend URL.
pub struct HttpForwarder {
    target: Url,
    client: UpstreamClient,
    request_timeout: Duration,
}

impl HttpForwarder {
    pub fn new(target: Url, client: UpstreamClient, request_timeout: Duration) -> Self {
        Self {
            target,
            client,
            request_timeout,
        }
    }
}

#[async_trait]
impl Forward for HttpForwarder {
    async fn forward(&self, mut request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        *request.uri_mut() = rewrite_uri(&self.target, request.uri())?;
        *request.version_mut() = Version::HTTP_11;

        let client_addr = request.extensions().get::<ClientAddr>().copied();
        strip_hop_by_hop(request.headers_mut());
        if let Some(ClientAddr(addr)) = client_addr {
            append_forwarded_for(request.headers_mut(), &addr.ip().to_string());
        }

        let response: Response<Incoming> =
            time::timeout(self.request_timeout, self.client.request(request))
                .await
                .map_err(|_| ForwardError::Timeout(self.request_timeout))??;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Map an inbound URI onto `target`: target path joined with the request
/// path, target query and request query joined with `&`.
pub fn rewrite_uri(target: &Url, uri: &Uri) -> Result<Uri, axum::http::uri::InvalidUri> {
    let path = join_paths(target.path(), uri.path());
    let query = match (target.query().unwrap_or(""), uri.query().unwrap_or("")) {
        ("", "") => String::new(),
        (t, "") => format!("?{}", t),
        ("", r) => format!("?{}", r),
        (t, r) => format!("?{}&{}", t, r),
    };
    let authority = &target[Position::BeforeHost..Position::AfterPort];

    format!("{}://{}{}{}", target.scheme(), authority, path, query).parse()
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Remove fixed hop-by-hop headers plus any named in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, client_ip: &str) {
    let value = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{}, {}", prior, client_ip),
        None => client_ip.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
