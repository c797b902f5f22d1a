//! 配置管理模块
//!
//! 该模块加载策略框架的启动配置，支持 YAML/JSON 文件和 `POLICYFW_` 前缀的
//! 环境变量，环境变量优先于文件。配置在启动时加载一次，之后只读。

use ::config::{Config, Environment, File, FileFormat};
use policyfw_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::policy::ComplianceEventConfig;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "POLICYFW";

/// 策略框架配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// 合规状态未知时是否按违规上报
    pub unknown_compliancy_means_violation: bool,
    /// 事件上报者名称
    pub controller_name: String,
    /// 日志级别
    pub log_level: String,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            unknown_compliancy_means_violation: true,
            controller_name: "policy-framework".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl FrameworkConfig {
    /// 从可选的配置文件和环境变量加载配置
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(config_path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(config_path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            let format = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml") | Some("yml") => FileFormat::Yaml,
                Some("json") => FileFormat::Json,
                _ => {
                    return Err(Error::Config(format!(
                        "不支持的配置文件格式，仅支持 YAML 或 JSON: {}",
                        path.display()
                    )))
                }
            };
            builder = builder.add_source(File::from(path).format(format));
            debug!("从 {} 加载框架配置", path.display());
        }

        builder
            .add_source(env.try_parsing(true))
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// 合规事件发布器使用的配置
    pub fn event_config(&self) -> ComplianceEventConfig {
        ComplianceEventConfig {
            unknown_compliancy_means_violation: self.unknown_compliancy_means_violation,
        }
    }
}
