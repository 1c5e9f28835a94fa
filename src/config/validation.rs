//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Parse and normalize backend endpoints
//! - Validate value ranges (intervals > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LbConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::LbConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no backends configured")]
    NoBackends,

    #[error("backend '{endpoint}' is not a valid URL: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("backend '{endpoint}' uses unsupported scheme '{scheme}' (only http is forwarded)")]
    UnsupportedScheme { endpoint: String, scheme: String },

    #[error("backend '{0}' has no host")]
    MissingHost(String),

    #[error("backend '{0}' is listed more than once")]
    DuplicateEndpoint(String),

    #[error("bind address '{0}' is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Parse a configured endpoint into a URL.
///
/// Endpoints written without a scheme (`localhost:3031`) are read as plain http.
pub fn parse_endpoint(raw: &str) -> Result<Url, ValidationError> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };

    let url = Url::parse(&candidate).map_err(|e| ValidationError::InvalidEndpoint {
        endpoint: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" {
        return Err(ValidationError::UnsupportedScheme {
            endpoint: raw.to_string(),
            scheme: url.scheme().to_string(),
        });
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::MissingHost(raw.to_string()));
    }

    Ok(url)
}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &LbConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen = HashSet::new();
    for backend in &config.backends {
        match parse_endpoint(&backend.url) {
            Ok(url) => {
                if !seen.insert(url.clone()) {
                    errors.push(ValidationError::DuplicateEndpoint(url.to_string()));
                }
            }
            Err(e) => errors.push(e),
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::Zero("health_check.interval_secs"));
    }
    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::Zero("health_check.timeout_secs"));
    }
    if config.dispatch.max_attempts == 0 {
        errors.push(ValidationError::Zero("dispatch.max_attempts"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
