//! Configuration validation.
//!
//! Serde handles the syntax; this module checks value ranges, endpoint URLs
//! and the fee format. Validation is a pure function and reports every
//! problem it finds, not just the first.

use thiserror::Error;
use url::Url;

use crate::config::schema::FeederConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("target.gas_prices: '{0}' is not of the form <decimal><denom>")]
    GasPrices(String),
}

/// Host and port extracted from an endpoint URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

/// Parse an endpoint URL into host and port, falling back to the scheme's
/// default port when none is given.
pub fn parse_endpoint(raw: &str) -> Result<Endpoint, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| "missing host".to_string())?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| "missing port".to_string())?;
    Ok(Endpoint {
        host: host.to_string(),
        port,
    })
}

/// A gas price such as `0.01133uluna`, kept as an exact decimal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPrice {
    /// Digits of the amount with the decimal point removed.
    pub mantissa: u128,
    /// Number of digits after the decimal point.
    pub scale: u32,
    pub denom: String,
}

impl GasPrice {
    /// `ceil(self * gas)`, in the smallest unit of `denom`.
    pub fn fee_for(&self, gas: u64) -> u128 {
        let numerator = self.mantissa.saturating_mul(gas as u128);
        let divisor = 10u128.pow(self.scale);
        numerator.div_ceil(divisor)
    }
}

/// Split a gas price such as `0.01133uluna` into its amount and denom.
pub fn parse_gas_price(raw: &str) -> Option<GasPrice> {
    let split = raw.find(|c: char| c.is_ascii_alphabetic())?;
    let (amount, denom) = raw.split_at(split);
    let (int_part, frac_part) = amount.split_once('.').unwrap_or((amount, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let scale = u32::try_from(frac_part.len()).ok().filter(|s| *s <= 18)?;
    let mantissa: u128 = format!("{}{}", int_part, frac_part).parse().ok()?;
    Some(GasPrice {
        mantissa,
        scale,
        denom: denom.to_string(),
    })
}

/// Validate a configuration, returning all errors found.
pub fn validate_config(config: &FeederConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("target.lcd_url", &config.target.lcd_url),
        ("reference.lcd_url", &config.reference.lcd_url),
    ] {
        if let Err(reason) = parse_endpoint(value) {
            errors.push(ValidationError::InvalidUrl {
                field,
                value: value.clone(),
                reason,
            });
        }
    }

    if config.target.chain_id.trim().is_empty() {
        errors.push(ValidationError::Empty("target.chain_id"));
    }
    if parse_gas_price(&config.target.gas_prices).is_none() {
        errors.push(ValidationError::GasPrices(config.target.gas_prices.clone()));
    }

    for (field, value) in [
        ("target.gas_limit", config.target.gas_limit),
        ("target.request_timeout_secs", config.target.request_timeout_secs),
        ("reference.request_timeout_secs", config.reference.request_timeout_secs),
        ("timing.commit_timeout_ms", config.timing.commit_timeout_ms),
        ("timing.refresh_interval_ms", config.timing.refresh_interval_ms),
        ("timing.connect_timeout_ms", config.timing.connect_timeout_ms),
        (
            "timing.restart_cooldown_commits",
            u64::from(config.timing.restart_cooldown_commits),
        ),
        ("default_params.vote_period", config.default_params.vote_period),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    if config.voter.feeder_address.trim().is_empty() {
        errors.push(ValidationError::Empty("voter.feeder_address"));
    }
    if config.voter.validator_address.trim().is_empty() {
        errors.push(ValidationError::Empty("voter.validator_address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
