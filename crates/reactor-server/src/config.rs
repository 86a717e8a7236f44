use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use reactor_rules::SYSTEM_TRIGGER_TYPES;
use serde::Deserialize;
use std::path::Path;

/// 使用内存存储的数据库地址
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub triggers: TriggerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// `memory` 使用内存存储，其它值作为 SeaORM 连接地址
    #[serde(default = "default_database_url")]
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TriggerConfig {
    /// 已注册的触发器类型
    #[serde(default = "default_trigger_types")]
    pub types: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

// 默认值函数
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9101
}

fn default_database_url() -> String {
    MEMORY_DATABASE_URL.to_string()
}

fn default_trigger_types() -> Vec<String> {
    SYSTEM_TRIGGER_TYPES.iter().map(|t| t.to_string()).collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            types: default_trigger_types(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// 加载配置：TOML 文件（不存在则使用默认值）+ `REACTOR__*` 环境变量
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("Invalid config path: {}", path.display()))?;

        let settings = Config::builder()
            .add_source(File::new(path_str, FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("REACTOR").separator("__"))
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(anyhow!("database.url must not be empty"));
        }
        // 连接池回收连接后内存库随之丢失
        if is_in_memory_sqlite(&self.database.url) {
            return Err(anyhow!(
                "database.url '{}' is an in-memory SQLite database; use \"{}\" or a file URL such as sqlite://reactor.db?mode=rwc",
                self.database.url,
                MEMORY_DATABASE_URL
            ));
        }
        if self.triggers.types.iter().any(|t| t.trim().is_empty()) {
            return Err(anyhow!("triggers.types must not contain empty entries"));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database.url == MEMORY_DATABASE_URL
    }
}

fn is_in_memory_sqlite(url: &str) -> bool {
    url.starts_with("sqlite:") && (url.contains(":memory:") || url.contains("mode=memory"))
}
