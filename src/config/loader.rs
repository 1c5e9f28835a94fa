//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::LbConfig;
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read a TOML file without validating it.
///
/// Command line overrides are applied before validation, so startup calls
/// [`validate_config`](crate::config::validate_config) itself.
pub fn read_config(path: &Path) -> Result<LbConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validation::validate_config;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("simple-lb-{}-{}.toml", name, std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_valid_file() {
        let path = write_temp(
            "valid",
            r#"
            [listener]
            bind_address = "127.0.0.1:4000"

            [[backends]]
            url = "http://127.0.0.1:3031"
            "#,
        );
        let config = read_config(&path).unwrap();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.listener.bind_address, "127.0.0.1:4000");
        assert_eq!(config.backends.len(), 1);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_validation_errors_joined() {
        let path = write_temp("empty", "[listener]\nbind_address = \"127.0.0.1:4000\"\n");
        let config = read_config(&path).unwrap();
        let err = ConfigError::Validation(validate_config(&config).unwrap_err());
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors == &vec![ValidationError::NoBackends]));
        assert_eq!(err.to_string(), "Validation failed: no backends configured");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_read_reports_parse_errors() {
        let path = write_temp("broken", "backends = 12");
        assert!(matches!(read_config(&path), Err(ConfigError::Parse(_))));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_config(Path::new("/nonexistent/simple-lb.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
