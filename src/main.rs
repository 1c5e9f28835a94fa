//! simple-lb
//!
//! A round-robin HTTP load balancer built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                  LOAD BALANCER                   │
//!                    │                                                  │
//!   Client Request   │  ┌─────────┐    ┌────────────┐    ┌──────────┐  │
//!   ─────────────────┼─▶│  http   │───▶│  dispatch  │───▶│   pool   │  │
//!                    │  │ server  │    │ controller │◀───│ (cursor) │  │
//!                    │  └─────────┘    └─────┬──────┘    └────▲─────┘  │
//!                    │                       │ retry/failover  │        │
//!                    │                       ▼                 │        │
//!   Client Response  │               ┌──────────────┐   ┌──────┴─────┐  │
//!   ◀────────────────┼───────────────│   backend    │   │   health   │  │     Backend
//!                    │               │  forwarder   │◀─▶│  monitor   │◀─┼──── Servers
//!                    │               └──────────────┘   └────────────┘  │
//!                    └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use simple_lb::config::{loader::read_config, BackendConfig, LbConfig};
use simple_lb::lifecycle::{signals, startup, Shutdown};
use simple_lb::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "simple-lb")]
#[command(about = "Round-robin HTTP load balancer with health checks", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load balanced backends, use commas to separate.
    #[arg(short, long, value_delimiter = ',')]
    backends: Vec<String>,

    /// Port to serve on.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Layer command line values over the file (or default) configuration.
    fn apply(&self, mut config: LbConfig) -> LbConfig {
        let backends: Vec<BackendConfig> = self
            .backends
            .iter()
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
            .map(BackendConfig::from)
            .collect();
        if !backends.is_empty() {
            config.backends = backends;
        }

        if let Some(port) = self.port {
            config.listener.bind_address = match config.listener.bind_address.parse::<SocketAddr>() {
                Ok(mut addr) => {
                    addr.set_port(port);
                    addr.to_string()
                }
                Err(_) => format!("0.0.0.0:{}", port),
            };
        }

        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => read_config(path)?,
        None => LbConfig::default(),
    };
    let config = cli.apply(config);

    logging::init(&config.observability.log_level);
    tracing::info!("simple-lb v{} starting", env!("CARGO_PKG_VERSION"));

    if config.backends.is_empty() {
        tracing::error!("Please provide one or more backends to load balance");
        return Err("no backends configured".into());
    }

    let shutdown = Shutdown::new();
    tokio::spawn(signals::forward_signals(shutdown.clone()));

    if let Err(e) = startup::start(config, &shutdown).await {
        tracing::error!(error = %e, "Load balancer failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
