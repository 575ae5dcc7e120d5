//! Run configuration.
//!
//! Configuration is loaded once from a TOML file (with `IMAGEHAUL_`-prefixed
//! environment overrides), validated, and passed by reference into the
//! components that need it. Core logic never reads the environment directly.

mod loader;
mod types;
mod validate;

pub use loader::{load_config, load_config_from_str};
pub use types::{
    AltTextConfig, BackendConfig, BackendKind, BatchConfig, CloudFrontConfig, CloudinaryConfig,
    Config, OptimizeConfig, SanitizedBackendConfig, SanitizedConfig, StoreConfig,
};
pub use validate::validate_config;

use thiserror::Error;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid config: {0}")]
    ValidationError(String),
}
