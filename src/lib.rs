//! Round-robin HTTP load balancer with health checking and failover.

pub mod config;
pub mod dispatch;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;

pub use config::LbConfig;
pub use dispatch::DispatchController;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::BackendPool;
