use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_address: String,
    pub cors_enabled: bool,
    pub request_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            cors_enabled: true,
            request_timeout_seconds: 30,
        }
    }
}

impl ConfigValidator for ApiConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_socket_addr(&self.bind_address, "api.bind_address")?;
        ValidationUtils::validate_timeout_seconds(
            self.request_timeout_seconds,
            "api.request_timeout_seconds",
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: String,
    pub metrics_enabled: bool,
    pub metrics_endpoint: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_endpoint: "/metrics".to_string(),
        }
    }
}

impl ConfigValidator for ObservabilityConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_one_of(
            &self.log_level,
            &["trace", "debug", "info", "warn", "error"],
            "observability.log_level",
        )?;
        ValidationUtils::validate_one_of(
            &self.log_format,
            &["json", "pretty", "compact"],
            "observability.log_format",
        )?;

        if self.metrics_enabled && !self.metrics_endpoint.starts_with('/') {
            return Err(crate::ConfigError::Validation(
                "observability.metrics_endpoint must start with '/'".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_validation() {
        let config = ApiConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid_config = config.clone();
        invalid_config.bind_address = "not-an-address".to_string();
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = config;
        invalid_config.request_timeout_seconds = 0;
        assert!(invalid_config.validate().is_err());
    }

    #[test]
    fn test_observability_config_validation() {
        let config = ObservabilityConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid_config = config.clone();
        invalid_config.log_level = "verbose".to_string();
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = config.clone();
        invalid_config.log_format = "xml".to_string();
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = config.clone();
        invalid_config.metrics_endpoint = "metrics".to_string();
        assert!(invalid_config.validate().is_err());

        // 关闭指标时不校验路径
        let mut disabled = config;
        disabled.metrics_enabled = false;
        disabled.metrics_endpoint = String::new();
        assert!(disabled.validate().is_ok());
    }
}
