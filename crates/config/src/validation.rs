use std::net::SocketAddr;

use crate::{ConfigError, ConfigResult};

pub trait ConfigValidator {
    fn validate(&self) -> ConfigResult<()>;
}

pub struct ValidationUtils;

impl ValidationUtils {
    pub fn validate_not_empty(value: &str, field_name: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{field_name} cannot be empty"
            )));
        }
        Ok(())
    }

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

    pub fn validate_socket_addr(value: &str, field_name: &str) -> ConfigResult<()> {
        value.parse::<SocketAddr>().map(|_| ()).map_err(|e| {
            ConfigError::Validation(format!("{field_name} is not a valid address: {e}"))
        })
    }

    pub fn validate_one_of(value: &str, allowed: &[&str], field_name: &str) -> ConfigResult<()> {
        if allowed.iter().any(|a| a.eq_ignore_ascii_case(value)) {
            return Ok(());
        }
        Err(ConfigError::Validation(format!(
            "{field_name} must be one of: {}",
            allowed.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_empty() {
        assert!(ValidationUtils::validate_not_empty("test", "field").is_ok());
        assert!(ValidationUtils::validate_not_empty("", "field").is_err());
        assert!(ValidationUtils::validate_not_empty("   ", "field").is_err());
    }

    #[test]
    fn test_validate_timeout_seconds() {
        assert!(ValidationUtils::validate_timeout_seconds(30, "t").is_ok());
        assert!(ValidationUtils::validate_timeout_seconds(3600, "t").is_ok());
        assert!(ValidationUtils::validate_timeout_seconds(0, "t").is_err());
        assert!(ValidationUtils::validate_timeout_seconds(3601, "t").is_err());
    }

    #[test]
    fn test_validate_count() {
        assert!(ValidationUtils::validate_count(1, "c").is_ok());
        assert!(ValidationUtils::validate_count(0, "c").is_err());
        assert!(ValidationUtils::validate_count(10001, "c").is_err());
    }

    #[test]
    fn test_validate_socket_addr() {
        assert!(ValidationUtils::validate_socket_addr("0.0.0.0:8080", "addr").is_ok());
        assert!(ValidationUtils::validate_socket_addr("[::1]:3000", "addr").is_ok());
        assert!(ValidationUtils::validate_socket_addr("localhost", "addr").is_err());
    }

    #[test]
    fn test_validate_one_of() {
        let formats = ["json", "pretty"];
        assert!(ValidationUtils::validate_one_of("JSON", &formats, "f").is_ok());
        assert!(ValidationUtils::validate_one_of("xml", &formats, "f").is_err());
    }
}
