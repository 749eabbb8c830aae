//! Post-parse validation.

use std::str::FromStr;

use glossa_messaging::TlsMode;
use tracing::warn;

use crate::error::ConfigError;
use crate::types::{BalancerConfig, ServerConfig, TranslatorConfig};

pub(crate) fn validate_server(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.num_workers == 0 {
        return Err(ConfigError::Invalid(
            "num_workers must be at least 1".to_owned(),
        ));
    }
    if config.source_lang.trim().is_empty() || config.target_lang.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "source_lang and target_lang must be set".to_owned(),
        ));
    }
    config
        .decoder
        .to_params()
        .validate()
        .map_err(ConfigError::Invalid)?;
    Ok(())
}

pub(crate) fn validate_balancer(config: &BalancerConfig) -> Result<(), ConfigError> {
    if config.num_workers == 0 {
        return Err(ConfigError::Invalid(
            "num_workers must be at least 1".to_owned(),
        ));
    }
    if config.reconnect.base_ms == 0 || config.reconnect.max_ms < config.reconnect.base_ms {
        return Err(ConfigError::Invalid(
            "reconnect backoff needs base_ms >= 1 and max_ms >= base_ms".to_owned(),
        ));
    }
    if config.translators.is_empty() {
        // Legal (every job gets an error reply) but almost never intended.
        warn!("no translators configured; all jobs will fail");
    }
    for translator in &config.translators {
        validate_translator(translator)?;
    }
    Ok(())
}

fn validate_translator(translator: &TranslatorConfig) -> Result<(), ConfigError> {
    let mode = match &translator.tls_mode {
        None => TlsMode::Undefined,
        Some(name) => TlsMode::from_str(name)
            .map_err(|e| ConfigError::Invalid(format!("translator {}: {e}", translator.uri)))?,
    };
    mode.check_uri(&translator.uri)
        .map_err(|e| ConfigError::Invalid(format!("translator {}: {e}", translator.uri)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReconnectConfig;

    fn balancer_with(translators: Vec<TranslatorConfig>) -> BalancerConfig {
        BalancerConfig {
            listen_addr: "127.0.0.1:9000".to_owned(),
            num_workers: 2,
            translators,
            reconnect: ReconnectConfig::default(),
        }
    }

    #[test]
    fn tls_mismatch_is_invalid() {
        let config = balancer_with(vec![TranslatorConfig {
            uri: "ws://localhost:9001".to_owned(),
            tls_mode: Some("mozilla_modern".to_owned()),
            ciphers: None,
        }]);
        assert!(matches!(
            validate_balancer(&config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn plain_translator_is_fine() {
        let config = balancer_with(vec![TranslatorConfig {
            uri: "ws://localhost:9001".to_owned(),
            tls_mode: None,
            ciphers: None,
        }]);
        assert!(validate_balancer(&config).is_ok());
    }

    #[test]
    fn zero_workers_are_rejected() {
        let mut config = balancer_with(vec![]);
        config.num_workers = 0;
        assert!(validate_balancer(&config).is_err());
    }
}
