//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the load balancer.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LbConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Backend servers, in rotation order.
    pub backends: Vec<BackendConfig>,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Retry and failover policy for request dispatch.
    pub dispatch: DispatchConfig,

    /// Upstream timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3030").
    pub bind_address: String,

    /// Largest request body buffered for forwarding.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3030".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Backend URL (e.g., "http://127.0.0.1:3031").
    pub url: String,
}

impl From<&str> for BackendConfig {
    fn from(url: &str) -> Self {
        Self { url: url.to_string() }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health checks.
    pub enabled: bool,

    /// Health check interval in seconds.
    pub interval_secs: u64,

    /// TCP connect timeout for a single probe in seconds.
    pub timeout_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 120,
            timeout_secs: 2,
        }
    }
}

/// Retry and failover policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Distinct backends tried for one request before giving up.
    pub max_attempts: u32,

    /// Retries against the same backend before it is marked dead.
    pub max_retries: u32,

    /// Fixed pause before retrying the same backend, in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_retries: 3,
            retry_delay_ms: 10,
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time for one upstream request/response in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
