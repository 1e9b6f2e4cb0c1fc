use thiserror::Error;
use tracing::warn;

pub const HOSTED_ZONE_ID: &str = "HOSTED_ZONE_ID";
pub const RECORD_SET_NAME: &str = "RECORD_SET_NAME";
pub const PRIMARY_IDENTIFIER: &str = "PRIMARY_IDENTIFIER";
pub const SECONDARY_IDENTIFIER: &str = "SECONDARY_IDENTIFIER";
pub const RECORD_TYPE: &str = "RECORD_TYPE";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),
}

/// Settings that identify the weighted record pair to toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct FailoverConfig {
    pub hosted_zone_id: String,
    /// Always fully qualified (ends with `.`).
    pub record_set_name: String,
    pub primary_identifier: String,
    pub secondary_identifier: String,
    pub record_type: String,
}

impl FailoverConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values count
    /// as missing, and every missing name is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut require = |var: &str| match lookup(var).filter(|value| !value.is_empty()) {
            Some(value) => value,
            None => {
                missing.push(var.to_string());
                String::new()
            }
        };

        let hosted_zone_id = require(HOSTED_ZONE_ID);
        let record_set_name = require(RECORD_SET_NAME);
        let primary_identifier = require(PRIMARY_IDENTIFIER);
        let secondary_identifier = require(SECONDARY_IDENTIFIER);
        let record_type = require(RECORD_TYPE);

        if !missing.is_empty() {
            return Err(ConfigError::MissingVariables(missing));
        }

        Ok(Self {
            hosted_zone_id,
            record_set_name: fully_qualified(record_set_name),
            primary_identifier,
            secondary_identifier,
            record_type,
        })
    }
}

fn fully_qualified(name: String) -> String {
    if name.ends_with('.') {
        return name;
    }

    warn!(
        "{} '{}' does not end with a dot. Adding it.",
        RECORD_SET_NAME, name
    );
    format!("{}.", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_settings() -> HashMap<String, String> {
        settings(&[
            (HOSTED_ZONE_ID, "Z1234567890ABC"),
            (RECORD_SET_NAME, "example.com."),
            (PRIMARY_IDENTIFIER, "primary"),
            (SECONDARY_IDENTIFIER, "secondary"),
            (RECORD_TYPE, "A"),
        ])
    }

    #[test]
    fn test_all_variables_present() {
        let vars = full_settings();
        let config = FailoverConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.hosted_zone_id, "Z1234567890ABC");
        assert_eq!(config.record_set_name, "example.com.");
        assert_eq!(config.primary_identifier, "primary");
        assert_eq!(config.secondary_identifier, "secondary");
        assert_eq!(config.record_type, "A");
    }

    #[test]
    fn test_missing_variables_are_all_reported() {
        let vars = settings(&[(HOSTED_ZONE_ID, "Z123")]);
        let err = FailoverConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Missing required environment variables: RECORD_SET_NAME, PRIMARY_IDENTIFIER, SECONDARY_IDENTIFIER, RECORD_TYPE"
        );
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut vars = full_settings();
        vars.insert(RECORD_TYPE.to_string(), String::new());

        let err = FailoverConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingVariables(vec![RECORD_TYPE.to_string()])
        );
    }

    #[test]
    fn test_adds_trailing_dot() {
        let mut vars = full_settings();
        vars.insert(RECORD_SET_NAME.to_string(), "example.com".to_string());

        let config = FailoverConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.record_set_name, "example.com.");
    }
}
