//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use crate::error::{Result, SharedError};
use crate::observability::ObservabilityConfig;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 单条规则文本的默认长度上限（64 KiB）
pub const DEFAULT_MAX_RULE_LENGTH: usize = 64 * 1024;

/// 规则引擎配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 是否默认输出评估追踪
    pub trace_enabled: bool,
    /// 规则文本长度上限（字节）
    pub max_rule_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trace_enabled: false,
            max_rule_length: DEFAULT_MAX_RULE_LENGTH,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（RULES 前缀，如 RULES__ENGINE__MAX_RULE_LENGTH -> engine.max_rule_length）
    pub fn load(service_name: &str) -> Result<Self> {
        let env = std::env::var("RULES_ENV").unwrap_or_else(|_| "development".to_string());

        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(service_name, &env, Path::new(&config_dir))
    }

    /// 从指定目录加载配置
    pub fn load_from(service_name: &str, env: &str, config_dir: &Path) -> Result<Self> {
        let builder = Config::builder()
            // 默认配置
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            // 加载默认配置文件
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // 加载环境特定配置
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            // 加载服务特定配置（如 rule-engine.toml）
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            // 环境变量覆盖（RULES__ENGINE__TRACE_ENABLED -> engine.trace_enabled）
            .add_source(
                Environment::with_prefix("RULES")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// 校验配置取值
    pub fn validate(&self) -> Result<()> {
        if self.engine.max_rule_length == 0 {
            return Err(SharedError::InvalidConfig {
                field: "engine.max_rule_length".to_string(),
                message: "必须大于 0".to_string(),
            });
        }

        if !matches!(self.observability.log_format.as_str(), "json" | "pretty") {
            return Err(SharedError::InvalidConfig {
                field: "observability.log_format".to_string(),
                message: format!("不支持的日志格式 '{}'", self.observability.log_format),
            });
        }

        Ok(())
    }
}
