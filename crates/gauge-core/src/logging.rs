//! Tracing subscriber setup

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{GaugeError, GaugeResult};
use tracing_subscriber::EnvFilter;

/// Build the event filter: `RUST_LOG` wins, otherwise the configured level.
pub fn build_filter(config: &LoggingConfig) -> GaugeResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            GaugeError::config_with_context(
                format!("Invalid log level '{}': {}", config.level, e),
                "logging.level",
            )
        }),
    }
}

/// Install the global tracing subscriber
///
/// Logs go to stderr so that summaries printed on stdout stay clean.
pub fn init_logging(config: &LoggingConfig) -> GaugeResult<()> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| GaugeError::config(format!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        // Only meaningful when RUST_LOG is unset.
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            level: "gauge=notalevel".to_string(),
            format: LogFormat::Compact,
        };
        assert!(build_filter(&config).is_err());
    }

    #[test]
    fn test_directive_level_accepted() {
        let config = LoggingConfig {
            level: "gauge_eval=debug,info".to_string(),
            format: LogFormat::Pretty,
        };
        assert!(build_filter(&config).is_ok());
    }
}
