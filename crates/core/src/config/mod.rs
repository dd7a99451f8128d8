//! Service configuration.
//!
//! A TOML file layered with `PRESSROOM_*` environment overrides. Every field
//! has a default, so an empty file (or no file) yields a runnable config;
//! [`validate_config`] rejects values the cache and batch runner cannot use.

mod loader;
mod types;
mod validate;

pub use loader::{load_config, load_config_from_env, load_config_from_str};
pub use types::*;
pub use validate::validate_config;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly named config file does not exist.
    #[error("Config file {0} does not exist")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    ParseError(String),

    #[error("Rejected configuration: {0}")]
    ValidationError(String),
}
