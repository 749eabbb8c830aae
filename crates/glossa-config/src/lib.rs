//! Glossa Config - configuration types and loading for the binaries.
//!
//! Each binary reads one TOML file (`--config <path>`); a few scalar
//! fields may be overridden through `GLOSSA_*` environment variables.
//! Loading parses, applies the overrides, then validates; a config that
//! loads is a config the process can run with.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod loader;
mod types;
mod validate;

pub use error::ConfigError;
pub use loader::{load_balancer_config, load_server_config};
pub use types::{
    BalancerConfig, DecoderSection, ReconnectConfig, ServerConfig, TranslatorConfig,
};
