//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Upper bound on a subscription's output buffer.
pub const MAX_OUTPUT_CAPACITY: usize = 65_536;

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_FORMATS: [&str; 4] = ["pretty", "compact", "json", "full"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_hub(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_hub(config: &Config) -> ConfigResult<()> {
    let hub = &config.hub;

    if hub.name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "hub.name".to_owned(),
            message: "hub name must not be empty".to_owned(),
        });
    }

    if hub.output_capacity == 0 || hub.output_capacity > MAX_OUTPUT_CAPACITY {
        return Err(ConfigError::ValidationError {
            field: "hub.output_capacity".to_owned(),
            message: format!(
                "output capacity {} is out of range; must be between 1 and {MAX_OUTPUT_CAPACITY}",
                hub.output_capacity
            ),
        });
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    if !VALID_LEVELS.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                VALID_LEVELS.join(", ")
            ),
        });
    }

    if !VALID_FORMATS.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                VALID_FORMATS.join(", ")
            ),
        });
    }

    Ok(())
}
