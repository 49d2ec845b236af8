// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, non-empty paths, and bounded timeouts.

use crate::diagnostic::ConfigError;
use crate::model::DeskrelayConfig;

/// Upper bound for the desk call timeout.
const MAX_DESK_TIMEOUT_SECS: u64 = 60;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["pretty", "json"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DeskrelayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.gateway.default_key_domain.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.default_key_domain must not be empty".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let timeout = config.desk.timeout_secs;
    if timeout == 0 || timeout > MAX_DESK_TIMEOUT_SECS {
        errors.push(ConfigError::Validation {
            message: format!(
                "desk.timeout_secs must be between 1 and {MAX_DESK_TIMEOUT_SECS}, got {timeout}"
            ),
        });
    }

    if config.coordination.transfer_marker.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "coordination.transfer_marker must not be empty".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` must be one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.format `{}` must be one of: {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
