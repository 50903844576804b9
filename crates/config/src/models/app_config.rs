use std::path::Path;

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use super::{
    api_observability::{ApiConfig, ObservabilityConfig},
    database::DatabaseConfig,
};
use crate::validation::ConfigValidator;

/// 未指定 `--config` 时依次尝试的配置文件
const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "config/taskboard.toml",
    "taskboard.toml",
    "/etc/taskboard/config.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 默认值 < 配置文件 < `TASKBOARD_` 环境变量
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_with_env(config_path, Self::environment())
    }

    /// 例：`TASKBOARD_DATABASE__URL` 覆盖 `database.url`
    pub fn environment() -> Environment {
        Environment::with_prefix("TASKBOARD")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    pub fn load_with_env(config_path: Option<&str>, env: Environment) -> Result<Self> {
        let defaults =
            ConfigBuilder::try_from(&AppConfig::default()).context("生成默认配置失败")?;
        let mut builder = ConfigBuilder::builder().add_source(defaults);

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else if let Some(path) = DEFAULT_CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        let config: AppConfig = builder
            .add_source(env)
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        self.database.validate()?;
        self.api.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::environment().source(Some(source))
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.database.url, "sqlite:taskboard.db");
        assert_eq!(config.api.bind_address, "0.0.0.0:8080");
        assert_eq!(config.observability.metrics_endpoint, "/metrics");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [api]
            bind_address = "127.0.0.1:3000"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.bind_address, "127.0.0.1:3000");
        assert!(config.api.cors_enabled);
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let toml_str = config.to_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_rejected_by_validation() {
        let result = AppConfig::from_toml(
            r#"
            [observability]
            log_format = "xml"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_file_then_environment() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[database]
url = "sqlite::memory:"
max_connections = 4

[observability]
log_format = "json"
"#
        )
        .unwrap();

        let env = env_from(&[
            ("TASKBOARD_DATABASE__MAX_CONNECTIONS", "8"),
            ("TASKBOARD_API__CORS_ENABLED", "false"),
        ]);
        let path = file.path().to_str().unwrap();
        let config = AppConfig::load_with_env(Some(path), env).unwrap();

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.database.idle_timeout_seconds, 600);
        assert_eq!(config.observability.log_format, "json");
        assert!(!config.api.cors_enabled);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = AppConfig::load_with_env(Some("/nonexistent/taskboard.toml"), env_from(&[]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_environment_override_fails_validation() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let path = file.path().to_str().unwrap();
        let env = env_from(&[("TASKBOARD_API__BIND_ADDRESS", "nowhere")]);
        assert!(AppConfig::load_with_env(Some(path), env).is_err());
    }
}
