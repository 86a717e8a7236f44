pub mod config;
pub mod logging;

use anyhow::Result;
use reactor_api::{create_router, AppState};
use reactor_rules::{
    InMemoryRuleStore, RuleLifecycleManager, RuleStore, SeaOrmRuleStore, StaticTriggerRegistry,
    TracingAuditSink,
};
use sea_orm::Database;
use std::sync::Arc;
use tracing::info;

pub use config::AppConfig;

/// 按配置创建规则存储
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn RuleStore>> {
    if config.uses_memory_store() {
        info!("Using in-memory rule store");
        return Ok(Arc::new(InMemoryRuleStore::new()));
    }

    let db = Database::connect(config.database.url.as_str()).await?;
    let store = SeaOrmRuleStore::new(Arc::new(db));
    store.setup_schema().await?;
    info!(url = %config.database.url, "Connected rule database");
    Ok(Arc::new(store))
}

/// 组装规则生命周期管理器
pub async fn build_manager(config: &AppConfig) -> Result<RuleLifecycleManager> {
    config.validate()?;
    let store = build_store(config).await?;
    let triggers = StaticTriggerRegistry::new(config.triggers.types.iter().cloned());
    info!(trigger_types = triggers.len(), "Trigger registry loaded");

    Ok(RuleLifecycleManager::new(
        store,
        Arc::new(triggers),
        Arc::new(TracingAuditSink),
    ))
}

/// 启动 HTTP 服务，收到 Ctrl-C 后退出
pub async fn run(config: AppConfig) -> Result<()> {
    let manager = build_manager(&config).await?;
    let app = create_router(AppState::new(manager));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Reactor rule API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Reactor rule API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
