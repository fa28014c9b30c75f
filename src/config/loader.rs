//! Configuration loading from disk.

use std::env;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `auth.signing_secret`, so the secret can
/// be kept out of the config file.
pub const SIGNING_SECRET_ENV: &str = "GATEWAY_SIGNING_SECRET";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// `GATEWAY_SIGNING_SECRET`, if set and non-empty, overrides the secret in
/// the file before validation runs.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: GatewayConfig = toml::from_str(&content)?;

    if let Ok(secret) = env::var(SIGNING_SECRET_ENV) {
        if !secret.trim().is_empty() {
            config.auth.signing_secret = secret;
        }
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
