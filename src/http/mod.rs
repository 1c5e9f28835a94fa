//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (axum::serve)
//!     → server.rs (router, middleware, catch-all handler)
//!     → request.rs (buffer body, capture client address)
//!     → [dispatch controller picks backend, retries, fails over]
//!     → forward.rs (rewrite URI, strip hop-by-hop, send upstream)
//!     → response.rs (backend response as-is, or the uniform 503)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::HttpForwarder;
pub use request::BufferedRequest;
pub use server::HttpServer;
