// SPDX-FileCopyrightText: 2026 Gauntlet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects every violation instead of failing fast.

use crate::model::GauntletConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<String>)` with all
/// collected validation errors.
pub fn validate_config(config: &GauntletConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.engine.stage_deadline_secs == 0 {
        errors.push("engine.stage_deadline_secs must be at least 1".to_string());
    }

    if config.engine.max_attempts == 0 {
        errors.push("engine.max_attempts must be at least 1".to_string());
    }

    if config.limits.rpm == 0 {
        errors.push("limits.rpm must be at least 1".to_string());
    }

    if config.limits.tpm == 0 {
        errors.push("limits.tpm must be at least 1".to_string());
    }

    if config.limits.rpd == 0 {
        errors.push("limits.rpd must be at least 1".to_string());
    }

    if config.gateway.host.trim().is_empty() {
        errors.push("gateway.host must not be empty".to_string());
    } else {
        let host = config.gateway.host.trim();
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.backend.model.trim().is_empty() {
        errors.push("backend.model must not be empty".to_string());
    }

    if config.backend.fast_model.trim().is_empty() {
        errors.push("backend.fast_model must not be empty".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GauntletConfig::default()).is_ok());
    }

    #[test]
    fn zero_attempts_rejected() {
        let mut config = GauntletConfig::default();
        config.engine.max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("max_attempts")));
    }

    #[test]
    fn all_violations_collected() {
        let mut config = GauntletConfig::default();
        config.engine.max_attempts = 0;
        config.limits.rpm = 0;
        config.gateway.host = String::new();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn bad_host_rejected() {
        let mut config = GauntletConfig::default();
        config.gateway.host = "not a host!".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("gateway.host")));
    }
}
