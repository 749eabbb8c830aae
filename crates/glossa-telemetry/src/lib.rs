//! Glossa Telemetry - logging setup for the glossa binaries.
//!
//! Thin wrapper over `tracing-subscriber`: an env-filter seeded from the
//! configured level (overridable through `RUST_LOG`) and a choice of
//! human-readable or JSON output.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

use tracing_subscriber::EnvFilter;

/// Output format of the log stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default level directive, e.g. `info` or `glossa_server=debug`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl LogConfig {
    /// Config with the given default level and pretty output.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::Pretty,
        }
    }

    /// Select the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Errors from logging initialisation.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The level directive did not parse.
    #[error("bad log directive: {0}")]
    BadDirective(String),

    /// A global subscriber is already installed.
    #[error("logging is already initialised")]
    AlreadyInitialised,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level when set.
///
/// # Errors
///
/// Returns [`TelemetryError`] for an unparsable directive or a second
/// initialisation.
pub fn setup_logging(config: &LogConfig) -> Result<(), TelemetryError> {
    let spec = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| config.level.clone());
    let filter = build_filter(&spec)?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match config.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|_| TelemetryError::AlreadyInitialised)
}

fn build_filter(spec: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(spec).map_err(|e| TelemetryError::BadDirective(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_directive_is_reported() {
        assert!(matches!(
            build_filter("definitely=not=a=filter"),
            Err(TelemetryError::BadDirective(_))
        ));
    }

    #[test]
    fn level_directives_parse() {
        assert!(build_filter("info").is_ok());
        assert!(build_filter("glossa_server=debug,info").is_ok());
    }
}
