use crate::{ConfigError, ConfigResult};

/// Trait for configuration validation
pub trait ConfigValidator {
    fn validate(&self) -> ConfigResult<()>;
}

/// General validation utilities
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate that a string is not empty
    pub fn validate_not_empty(value: &str, field_name: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{field_name} cannot be empty"
            )));
        }
        Ok(())
    }

    /// Validate that a timeout is reasonable
    pub fn validate_timeout_seconds(timeout_seconds: u64, field_name: &str) -> ConfigResult<()> {
        if timeout_seconds == 0 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if timeout_seconds > 3600 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be less than or equal to 3600"
            )));
        }
        Ok(())
    }

    /// Validate that a count is reasonable
    pub fn validate_count(count: usize, field_name: &str) -> ConfigResult<()> {
        if count == 0 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if count > 10000 {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be less than or equal to 10000"
            )));
        }
        Ok(())
    }

    /// Validate that a URL parses and uses one of the allowed schemes
    pub fn validate_url(url: &str, schemes: &[&str], field_name: &str) -> ConfigResult<()> {
        Self::validate_not_empty(url, field_name)?;

        let parsed = url::Url::parse(url)
            .map_err(|e| ConfigError::Validation(format!("{field_name} is not a valid URL: {e}")))?;
        if !schemes.contains(&parsed.scheme()) {
            return Err(ConfigError::Validation(format!(
                "{field_name} must use one of the schemes: {}",
                schemes.join(", ")
            )));
        }
        Ok(())
    }

    /// Container and queue names: 3-63 lowercase letters, digits or hyphens,
    /// starting with a letter or digit, no consecutive hyphens
    pub fn validate_resource_name(name: &str, field_name: &str) -> ConfigResult<()> {
        let valid = (3..=63).contains(&name.len())
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && name.chars().next().is_some_and(|c| c != '-')
            && !name.ends_with('-')
            && !name.contains("--");
        if !valid {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be 3-63 lowercase letters, digits or single hyphens: {name}"
            )));
        }
        Ok(())
    }

    /// Table names: 3-63 ASCII alphanumerics starting with a letter
    pub fn validate_table_name(name: &str, field_name: &str) -> ConfigResult<()> {
        let valid = (3..=63).contains(&name.len())
            && name.chars().all(|c| c.is_ascii_alphanumeric())
            && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        if !valid {
            return Err(ConfigError::Validation(format!(
                "{field_name} must be 3-63 alphanumeric characters starting with a letter: {name}"
            )));
        }
        Ok(())
    }
}
