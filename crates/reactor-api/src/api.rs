use crate::{handlers, state::AppState};
use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// 创建 API 路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 规则管理 API
        .route(
            "/api/v1/rules",
            get(handlers::list_rules).post(handlers::create_rule),
        )
        .route(
            "/api/v1/rules/:rule_id",
            get(handlers::get_rule)
                .put(handlers::update_rule)
                .delete(handlers::delete_rule),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 健康检查
async fn health_check() -> &'static str {
    "OK"
}
