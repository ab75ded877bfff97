//! Logging setup for processes embedding FlowScope

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Install a global `tracing` subscriber described by `config`.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this
/// again after a subscriber is installed is a no-op.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| Error::config(format!("invalid log level '{}': {e}", config.level)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    // try_init only fails when a global subscriber already exists
    let _ = match config.format.as_str() {
        "json" => builder.json().try_init(),
        "pretty" => builder.try_init(),
        other => {
            return Err(Error::config(format!(
                "unknown log format '{other}', expected 'json' or 'pretty'"
            )))
        }
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_format_rejected() {
        let config = LoggingConfig {
            level: "info".to_string(),
            format: "xml".to_string(),
        };

        assert!(matches!(init(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_init_twice_is_ok() {
        let config = LoggingConfig::default();

        assert!(init(&config).is_ok());
        assert!(init(&config).is_ok());
    }
}
