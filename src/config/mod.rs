//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) and/or command line
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides applied (main.rs)
//!     → validation.rs (semantic checks)
//!     → LbConfig (validated, immutable)
//!     → lifecycle::startup builds the backend pool
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the backend set is fixed at startup
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{read_config, ConfigError};
pub use schema::BackendConfig;
pub use schema::DispatchConfig;
pub use schema::HealthCheckConfig;
pub use schema::LbConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::TimeoutConfig;
pub use validation::{parse_endpoint, validate_config, ValidationError};
