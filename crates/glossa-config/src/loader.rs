//! Config file loading and environment overrides.

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::types::{BalancerConfig, ServerConfig};
use crate::validate;

/// Environment override for the listen address.
const ENV_LISTEN_ADDR: &str = "GLOSSA_LISTEN_ADDR";
/// Environment override for the worker count.
const ENV_NUM_WORKERS: &str = "GLOSSA_NUM_WORKERS";

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

fn env_override(listen_addr: &mut String, num_workers: &mut usize) -> Result<(), ConfigError> {
    if let Ok(addr) = std::env::var(ENV_LISTEN_ADDR) {
        debug!(%addr, "listen address overridden from {ENV_LISTEN_ADDR}");
        *listen_addr = addr;
    }
    if let Ok(workers) = std::env::var(ENV_NUM_WORKERS) {
        *num_workers = workers.parse().map_err(|e| {
            ConfigError::Invalid(format!("{ENV_NUM_WORKERS} is not a worker count: {e}"))
        })?;
    }
    Ok(())
}

/// Load and validate a translation-server configuration.
///
/// # Errors
///
/// Returns [`ConfigError`] for unreadable files, TOML that does not match
/// the schema, or semantically unusable values.
pub fn load_server_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let mut config: ServerConfig = read_toml(path)?;
    env_override(&mut config.listen_addr, &mut config.num_workers)?;
    validate::validate_server(&config)?;
    info!(path = %path.display(), listen = %config.listen_addr, "server config loaded");
    Ok(config)
}

/// Load and validate a balancer configuration.
///
/// # Errors
///
/// Returns [`ConfigError`] for unreadable files, TOML that does not match
/// the schema, or semantically unusable values.
pub fn load_balancer_config(path: &Path) -> Result<BalancerConfig, ConfigError> {
    let mut config: BalancerConfig = read_toml(path)?;
    env_override(&mut config.listen_addr, &mut config.num_workers)?;
    validate::validate_balancer(&config)?;
    info!(
        path = %path.display(),
        listen = %config.listen_addr,
        translators = config.translators.len(),
        "balancer config loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_a_server_config() {
        let file = write_config(
            r#"
            listen_addr = "127.0.0.1:9001"
            source_lang = "en"
            target_lang = "de"
            lm_file = "models/en-de.lm"
            tm_file = "models/en-de.tm"
            rm_file = "models/en-de.rm"

            [decoder]
            stack_capacity = 64
            "#,
        );
        let config = load_server_config(file.path()).unwrap();
        assert_eq!(config.num_workers, 4);
        assert_eq!(config.decoder.to_params().stack_capacity, 64);
    }

    #[test]
    fn loads_a_balancer_config() {
        let file = write_config(
            r#"
            listen_addr = "127.0.0.1:9000"

            [[translators]]
            uri = "ws://127.0.0.1:9001"

            [[translators]]
            uri = "wss://translate.example:9002"
            tls_mode = "mozilla_intermediate"
            "#,
        );
        let config = load_balancer_config(file.path()).unwrap();
        assert_eq!(config.translators.len(), 2);
        assert_eq!(config.reconnect.base_ms, 1_000);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let file = write_config(
            r#"
            listen_addr = "127.0.0.1:9000"
            surprise = true
            "#,
        );
        assert!(matches!(
            load_balancer_config(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
