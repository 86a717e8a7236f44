use crate::config::{LogFormat, LoggingConfig};
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// 初始化 tracing；`RUST_LOG` 优先于配置中的级别
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match config.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
