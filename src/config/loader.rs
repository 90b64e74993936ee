//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::FeederConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Environment overrides, in precedence order per field. The second name of
/// each pair is the legacy mainnet/testnet spelling.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("TARGET_LCD_URL", "TESTNET_LCD_URL"),
    ("TARGET_CHAIN_ID", "TESTNET_CHAIN_ID"),
    ("REFERENCE_LCD_URL", "MAINNET_LCD_URL"),
    ("REFERENCE_CHAIN_ID", "MAINNET_CHAIN_ID"),
    ("FEEDER_ADDRESS", "FEEDER_ADDRESS"),
    ("VALIDATOR_ADDRESS", "VALIDATOR_ADDRESS"),
];

/// Apply environment overrides using the given lookup.
pub fn apply_env_overrides<F>(config: &mut FeederConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for (primary, legacy) in ENV_OVERRIDES {
        let Some(value) = lookup(primary).or_else(|| lookup(legacy)) else {
            continue;
        };
        let slot = match *primary {
            "TARGET_LCD_URL" => &mut config.target.lcd_url,
            "TARGET_CHAIN_ID" => &mut config.target.chain_id,
            "REFERENCE_LCD_URL" => &mut config.reference.lcd_url,
            "REFERENCE_CHAIN_ID" => &mut config.reference.chain_id,
            "FEEDER_ADDRESS" => &mut config.voter.feeder_address,
            "VALIDATOR_ADDRESS" => &mut config.voter.validator_address,
            _ => continue,
        };
        tracing::debug!(var = %primary, "Applying environment override");
        *slot = value;
    }
}

/// Load configuration from an optional TOML file, apply environment
/// overrides and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<FeederConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => FeederConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
