use std::collections::HashSet;

use super::{AppConfig, ConfigError};
use crate::registry::builtin;

/// Validate the full application config, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any configuration invariant is violated.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_log_level(config)?;
    validate_translation_pairs(config)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_log_level(config: &AppConfig) -> Result<(), ConfigError> {
    let valid_levels = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL", "DISABLED"];
    if !valid_levels.contains(&config.features.log_level.to_uppercase().as_str()) {
        return Err(validation_err(format!(
            "log_level must be one of {valid_levels:?}"
        )));
    }
    Ok(())
}

fn validate_translation_pairs(config: &AppConfig) -> Result<(), ConfigError> {
    let pairs = &config.translation.pairs;
    if pairs.is_empty() {
        return Err(validation_err("translation.pairs must not be empty"));
    }
    let mut seen = HashSet::new();
    for pair in pairs {
        let key = pair.key().map_err(|e| {
            validation_err(format!(
                "translation pair '{} -> {}': {e}",
                pair.source, pair.target
            ))
        })?;
        if builtin(key).is_none() {
            return Err(validation_err(format!(
                "translation pair '{key}' has no built-in translator"
            )));
        }
        if !seen.insert(key) {
            return Err(validation_err(format!(
                "duplicate translation pair '{key}'"
            )));
        }
    }
    Ok(())
}
