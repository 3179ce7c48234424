use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    api::ApiConfig,
    logging::LoggingConfig,
    queue::QueueConfig,
    stores::{BlobStoreConfig, RecordStoreConfig},
    timeouts::TimeoutConfig,
};
use crate::validation::ConfigValidator;

const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "config/taskboard.toml",
    "taskboard.toml",
    "/etc/taskboard/config.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub record_store: RecordStoreConfig,
    pub blob_store: BlobStoreConfig,
    pub queue: QueueConfig,
    pub timeouts: TimeoutConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 全部使用内存实现的配置，用于本地开发和测试
    pub fn in_memory() -> Self {
        Self {
            record_store: RecordStoreConfig::in_memory_default(),
            blob_store: BlobStoreConfig::in_memory_default(),
            queue: QueueConfig::in_memory_default(),
            ..Self::default()
        }
    }

    /// 加载配置：默认值 < 配置文件 < `TASKBOARD_` 前缀的环境变量
    ///
    /// 环境变量中用 `__` 分隔层级，例如 `TASKBOARD_RECORD_STORE__TABLE_NAME`。
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_with_env(config_path, None)
    }

    /// 与 [`AppConfig::load`] 相同，但可以用给定的键值表代替进程环境变量
    pub fn load_with_env(
        config_path: Option<&str>,
        env_source: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = ConfigBuilder::builder().add_source(
            ConfigBuilder::try_from(&AppConfig::default()).context("生成默认配置失败")?,
        );

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else if let Some(path) = DEFAULT_CONFIG_PATHS
            .iter()
            .find(|path| Path::new(path).exists())
        {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("TASKBOARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env_source),
        );

        let config: AppConfig = builder
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
        self.api.validate()?;
        self.record_store.validate()?;
        self.blob_store.validate()?;
        self.queue.validate()?;
        self.timeouts.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
