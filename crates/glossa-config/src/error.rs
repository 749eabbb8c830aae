//! Error types for configuration loading.

use std::path::PathBuf;

/// Errors produced while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for the expected shape.
    #[error("cannot parse config {path}: {source}")]
    Parse {
        /// Path of the config file.
        path: PathBuf,
        /// TOML diagnostic.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// The parsed configuration is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
