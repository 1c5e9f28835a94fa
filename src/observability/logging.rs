//! Structured logging.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to this
//! crate and to tower-http's request spans.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a configured level.
pub fn default_directive(log_level: &str) -> String {
    format!("simple_lb={level},tower_http={level}", level = log_level)
}

/// Initialize the global tracing subscriber.
pub fn init(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
